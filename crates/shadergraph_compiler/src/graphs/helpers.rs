// SPDX-License-Identifier: MIT OR Apache-2.0
//! GLSL helper functions shared by noise and color nodes.
//!
//! Registration order is emission order; every helper is registered after
//! the helpers it calls.

use crate::node::{HelperFunction, NodeRegistry};

const HASH12: &str = r"float hash12(vec2 p) {
    return fract(sin(dot(p, vec2(12.9898, 78.233))) * 43758.5453);
}";

const HASH22: &str = r"vec2 hash22(vec2 p) {
    p = vec2(dot(p, vec2(127.1, 311.7)), dot(p, vec2(269.5, 183.3)));
    return fract(sin(p) * 43758.5453);
}";

const PERLIN: &str = r"float perlin(vec2 p) {
    vec2 i = floor(p);
    vec2 f = fract(p);
    f = f * f * (3.0 - 2.0 * f);
    float a = hash12(i);
    float b = hash12(i + vec2(1.0, 0.0));
    float c = hash12(i + vec2(0.0, 1.0));
    float d = hash12(i + vec2(1.0, 1.0));
    return mix(mix(a, b, f.x), mix(c, d, f.x), f.y);
}";

const SIMPLEX: &str = r"float simplex(vec2 p) {
    const float K1 = 0.366025404;
    const float K2 = 0.211324865;
    vec2 i = floor(p + (p.x + p.y) * K1);
    vec2 a = p - i + (i.x + i.y) * K2;
    float m = step(a.y, a.x);
    vec2 o = vec2(m, 1.0 - m);
    vec2 b = a - o + K2;
    vec2 c = a - 1.0 + 2.0 * K2;
    vec3 h = max(0.5 - vec3(dot(a, a), dot(b, b), dot(c, c)), 0.0);
    vec3 n = h * h * h * h * vec3(
        dot(a, hash22(i) * 2.0 - 1.0),
        dot(b, hash22(i + o) * 2.0 - 1.0),
        dot(c, hash22(i + 1.0) * 2.0 - 1.0));
    return dot(n, vec3(70.0));
}";

// GLSL ES 1.0 needs a constant loop bound, hence the early break.
const FBM_NOISE: &str = r"float fbmNoise(vec2 p, int octaves) {
    float value = 0.0;
    float amplitude = 0.5;
    for (int i = 0; i < 8; i++) {
        if (i >= octaves) break;
        value += amplitude * perlin(p);
        p *= 2.0;
        amplitude *= 0.5;
    }
    return value;
}";

const VORONOI: &str = r"float voronoi(vec2 p) {
    vec2 cell = floor(p);
    vec2 local = fract(p);
    float nearest = 8.0;
    for (int y = -1; y <= 1; y++) {
        for (int x = -1; x <= 1; x++) {
            vec2 offset = vec2(float(x), float(y));
            vec2 r = offset + hash22(cell + offset) - local;
            nearest = min(nearest, dot(r, r));
        }
    }
    return sqrt(nearest);
}";

const RGB_TO_HSV: &str = r"vec3 rgbToHsv(vec3 c) {
    vec4 K = vec4(0.0, -1.0 / 3.0, 2.0 / 3.0, -1.0);
    vec4 p = mix(vec4(c.bg, K.wz), vec4(c.gb, K.xy), step(c.b, c.g));
    vec4 q = mix(vec4(p.xyw, c.r), vec4(c.r, p.yzx), step(p.x, c.r));
    float d = q.x - min(q.w, q.y);
    float e = 1.0e-10;
    return vec3(abs(q.z + (q.w - q.y) / (6.0 * d + e)), d / (q.x + e), q.x);
}";

const HSV_TO_RGB: &str = r"vec3 hsvToRgb(vec3 c) {
    vec4 K = vec4(1.0, 2.0 / 3.0, 1.0 / 3.0, 3.0);
    vec3 p = abs(fract(c.xxx + K.xyz) * 6.0 - K.www);
    return c.z * mix(K.xxx, clamp(p - K.xxx, 0.0, 1.0), c.y);
}";

/// Register the helper library
pub fn register_helpers(registry: &mut NodeRegistry) {
    registry.register_helper(HelperFunction::new("hash12", HASH12));
    registry.register_helper(HelperFunction::new("hash22", HASH22));
    registry.register_helper(HelperFunction::new("perlin", PERLIN).requires("hash12"));
    registry.register_helper(HelperFunction::new("simplex", SIMPLEX).requires("hash22"));
    registry.register_helper(HelperFunction::new("fbmNoise", FBM_NOISE).requires("perlin"));
    registry.register_helper(HelperFunction::new("voronoi", VORONOI).requires("hash22"));
    registry.register_helper(HelperFunction::new("rgbToHsv", RGB_TO_HSV));
    registry.register_helper(HelperFunction::new("hsvToRgb", HSV_TO_RGB));
}
