// SPDX-License-Identifier: MIT OR Apache-2.0
//! Fragment shader node catalog.
//!
//! Every node type declares its ports, parameters and a GLSL template. The
//! templates name the declared type of each variable they introduce.

use super::helpers::register_helpers;
use crate::node::{NodeCategory, NodeRegistry, NodeTypeDefinition};
use crate::port::{DataType, PortDef};
use crate::value::{Literal, ParameterDef};

/// Create the shader graph node registry with all available node types
pub fn create_shader_registry() -> NodeRegistry {
    let mut registry = NodeRegistry::new();
    register_helpers(&mut registry);

    // ========================================================================
    // Input Nodes
    // ========================================================================

    registry.register(
        NodeTypeDefinition::new("uv_input", "UV Coordinates", NodeCategory::Input)
            .describe("Normalized screen coordinates")
            .output(PortDef::output("uv", DataType::Vec2))
            .output(PortDef::output("x", DataType::Float))
            .output(PortDef::output("y", DataType::Float))
            .emit(
                "vec2 {out.uv} = fragCoord / iResolution.xy;\n\
                 float {out.x} = {out.uv}.x;\n\
                 float {out.y} = {out.uv}.y;",
            ),
    );

    registry.register(
        NodeTypeDefinition::new("time_input", "Time", NodeCategory::Input)
            .describe("Seconds since the shader started")
            .output(PortDef::output("time", DataType::Float))
            .emit("float {out.time} = iTime;"),
    );

    registry.register(
        NodeTypeDefinition::new("mouse_input", "Mouse", NodeCategory::Input)
            .describe("Normalized mouse position")
            .output(PortDef::output("mouse", DataType::Vec2))
            .emit("vec2 {out.mouse} = iMouse.xy / iResolution.xy;"),
    );

    registry.register(
        NodeTypeDefinition::new("float_constant", "Float", NodeCategory::Input)
            .describe("Constant float value")
            .output(PortDef::output("value", DataType::Float))
            .parameter(ParameterDef::float("value", 1.0, -10.0, 10.0))
            .emit("float {out.value} = {param.value};"),
    );

    registry.register(
        NodeTypeDefinition::new("vec2_constant", "Vector2", NodeCategory::Input)
            .describe("Constant 2D vector")
            .output(PortDef::output("vec", DataType::Vec2))
            .parameter(ParameterDef::float("x", 0.0, -10.0, 10.0))
            .parameter(ParameterDef::float("y", 0.0, -10.0, 10.0))
            .emit("vec2 {out.vec} = vec2({param.x}, {param.y});"),
    );

    registry.register(
        NodeTypeDefinition::new("vec3_constant", "Vector3", NodeCategory::Input)
            .describe("Constant 3D vector")
            .output(PortDef::output("vec", DataType::Vec3))
            .parameter(ParameterDef::float("x", 0.0, -10.0, 10.0))
            .parameter(ParameterDef::float("y", 0.0, -10.0, 10.0))
            .parameter(ParameterDef::float("z", 0.0, -10.0, 10.0))
            .emit("vec3 {out.vec} = vec3({param.x}, {param.y}, {param.z});"),
    );

    // ========================================================================
    // Math Operations
    // ========================================================================

    registry.register(binary("add", "Add", "Add two values", "{in.a} + {in.b}"));
    registry.register(binary("subtract", "Subtract", "Subtract B from A", "{in.a} - {in.b}"));
    registry.register(binary("multiply", "Multiply", "Multiply two values", "{in.a} * {in.b}"));
    registry.register(binary(
        "divide",
        "Divide",
        "Divide A by B, with B clamped away from zero",
        "{in.a} / max({in.b}, 0.001)",
    ));
    registry.register(binary("min", "Minimum", "Smaller of two values", "min({in.a}, {in.b})"));
    registry.register(binary("max", "Maximum", "Larger of two values", "max({in.a}, {in.b})"));

    registry.register(
        NodeTypeDefinition::new("power", "Power", NodeCategory::Operation)
            .describe("Raise base to an exponent")
            .input(PortDef::input("base", DataType::Float))
            .input(PortDef::input("exponent", DataType::Float))
            .output(PortDef::output("result", DataType::Float))
            .emit("float {out.result} = pow({in.base}, {in.exponent});"),
    );

    registry.register(
        NodeTypeDefinition::new("mod", "Modulo", NodeCategory::Operation)
            .describe("Remainder of value / divisor")
            .input(PortDef::input("value", DataType::Float))
            .input(PortDef::input("divisor", DataType::Float))
            .output(PortDef::output("result", DataType::Float))
            .emit("float {out.result} = mod({in.value}, {in.divisor});"),
    );

    registry.register(
        NodeTypeDefinition::new("clamp", "Clamp", NodeCategory::Operation)
            .describe("Constrain a value to a range")
            .input(PortDef::input("value", DataType::Float))
            .input(PortDef::input("min", DataType::Float).with_default(Literal::Float(0.0)))
            .input(PortDef::input("max", DataType::Float).with_default(Literal::Float(1.0)))
            .output(PortDef::output("result", DataType::Float))
            .emit("float {out.result} = clamp({in.value}, {in.min}, {in.max});"),
    );

    registry.register(
        NodeTypeDefinition::new("lerp", "Lerp", NodeCategory::Operation)
            .describe("Linear interpolation, t clamped to [0, 1]")
            .input(PortDef::input("a", DataType::Float))
            .input(PortDef::input("b", DataType::Float))
            .input(PortDef::input("t", DataType::Float))
            .output(PortDef::output("result", DataType::Float))
            .emit("float {out.result} = mix({in.a}, {in.b}, clamp({in.t}, 0.0, 1.0));"),
    );

    registry.register(
        NodeTypeDefinition::new("smoothstep", "Smoothstep", NodeCategory::Operation)
            .describe("Hermite interpolation between two edges")
            .input(PortDef::input("edge0", DataType::Float))
            .input(PortDef::input("edge1", DataType::Float))
            .input(PortDef::input("x", DataType::Float))
            .output(PortDef::output("result", DataType::Float))
            .emit("float {out.result} = smoothstep({in.edge0}, {in.edge1}, {in.x});"),
    );

    registry.register(
        NodeTypeDefinition::new("step", "Step", NodeCategory::Operation)
            .describe("0.0 below the edge, 1.0 at or above it")
            .input(PortDef::input("edge", DataType::Float))
            .input(PortDef::input("x", DataType::Float))
            .output(PortDef::output("result", DataType::Float))
            .emit("float {out.result} = step({in.edge}, {in.x});"),
    );

    for (id, label, function) in [
        ("sin", "Sine", "sin"),
        ("cos", "Cosine", "cos"),
        ("tan", "Tangent", "tan"),
        ("sqrt", "Square Root", "sqrt"),
        ("abs", "Absolute", "abs"),
        ("floor", "Floor", "floor"),
        ("ceil", "Ceil", "ceil"),
        ("fract", "Fraction", "fract"),
        ("sign", "Sign", "sign"),
    ] {
        registry.register(unary(id, label, &format!("{function}({{in.value}})")));
    }
    registry.register(unary("negate", "Negate", "-{in.value}"));

    // ========================================================================
    // Noise
    // ========================================================================

    registry.register(noise("perlin_noise", "Perlin Noise", "noise", "perlin"));
    registry.register(noise("simplex_noise", "Simplex Noise", "noise", "simplex"));
    registry.register(noise("voronoi", "Voronoi", "distance", "voronoi"));

    registry.register(
        NodeTypeDefinition::new("fbm", "FBM", NodeCategory::Utility)
            .describe("Fractal Brownian motion over Perlin noise")
            .input(PortDef::input("coord", DataType::Vec2))
            .output(PortDef::output("fbm", DataType::Float))
            .parameter(ParameterDef::float("scale", 1.0, 0.1, 10.0))
            .parameter(ParameterDef::int("octaves", 4, 1, 8))
            .emit("float {out.fbm} = fbmNoise({in.coord} * {param.scale}, {param.octaves});")
            .helper("fbmNoise"),
    );

    // ========================================================================
    // Signed Distance Fields
    // ========================================================================

    registry.register(
        NodeTypeDefinition::new("sdf_sphere", "SDF Sphere", NodeCategory::Utility)
            .describe("Distance to a sphere at the origin")
            .input(PortDef::input("point", DataType::Vec3))
            .input(PortDef::input("radius", DataType::Float).with_default(Literal::Float(0.5)))
            .output(PortDef::output("distance", DataType::Float))
            .emit("float {out.distance} = length({in.point}) - {in.radius};"),
    );

    registry.register(
        NodeTypeDefinition::new("sdf_box", "SDF Box", NodeCategory::Utility)
            .describe("Distance to an axis-aligned box at the origin")
            .input(PortDef::input("point", DataType::Vec3))
            .input(PortDef::input("size", DataType::Vec3).with_default(Literal::Vec3([0.5, 0.5, 0.5])))
            .output(PortDef::output("distance", DataType::Float))
            .emit(
                "vec3 {local.q} = abs({in.point}) - {in.size};\n\
                 float {out.distance} = length(max({local.q}, 0.0)) + min(max({local.q}.x, max({local.q}.y, {local.q}.z)), 0.0);",
            ),
    );

    registry.register(
        NodeTypeDefinition::new("sdf_torus", "SDF Torus", NodeCategory::Utility)
            .describe("Distance to a torus in the XZ plane")
            .input(PortDef::input("point", DataType::Vec3))
            .input(PortDef::input("majorRadius", DataType::Float).with_default(Literal::Float(1.0)))
            .input(PortDef::input("minorRadius", DataType::Float).with_default(Literal::Float(0.25)))
            .output(PortDef::output("distance", DataType::Float))
            .emit(
                "float {out.distance} = length(vec2(length({in.point}.xz) - {in.majorRadius}, {in.point}.y)) - {in.minorRadius};",
            ),
    );

    // ========================================================================
    // Conversions
    // ========================================================================

    registry.register(
        NodeTypeDefinition::new("float_to_vec2", "Float to Vec2", NodeCategory::Utility)
            .describe("Broadcast a float to every component")
            .input(PortDef::input("value", DataType::Float))
            .output(PortDef::output("vec", DataType::Vec2))
            .emit("vec2 {out.vec} = vec2({in.value});"),
    );

    registry.register(
        NodeTypeDefinition::new("float_to_vec3", "Float to Vec3", NodeCategory::Utility)
            .describe("Broadcast a float to every component")
            .input(PortDef::input("value", DataType::Float))
            .output(PortDef::output("vec", DataType::Vec3))
            .emit("vec3 {out.vec} = vec3({in.value});"),
    );

    registry.register(
        NodeTypeDefinition::new("float_to_vec4", "Float to Vec4", NodeCategory::Utility)
            .describe("Broadcast a float to every component")
            .input(PortDef::input("value", DataType::Float))
            .output(PortDef::output("vec", DataType::Vec4))
            .emit("vec4 {out.vec} = vec4({in.value});"),
    );

    registry.register(
        NodeTypeDefinition::new("vec3_to_vec4", "Vec3 to Vec4", NodeCategory::Utility)
            .describe("Extend a vec3 with a W component")
            .input(PortDef::input("vec3", DataType::Vec3))
            .output(PortDef::output("vec4", DataType::Vec4))
            .parameter(ParameterDef::float("w", 1.0, 0.0, 1.0))
            .emit("vec4 {out.vec4} = vec4({in.vec3}, {param.w});"),
    );

    registry.register(split("split_vec2", "Split Vec2", DataType::Vec2, &["x", "y"]));
    registry.register(split("split_vec3", "Split Vec3", DataType::Vec3, &["x", "y", "z"]));
    registry.register(split("split_vec4", "Split Vec4", DataType::Vec4, &["x", "y", "z", "w"]));

    // ========================================================================
    // Vector Nodes
    // ========================================================================

    registry.register(
        NodeTypeDefinition::new("vec2_construct", "Make Vec2", NodeCategory::Vector)
            .describe("Build a vec2 from components")
            .input(PortDef::input("x", DataType::Float))
            .input(PortDef::input("y", DataType::Float))
            .output(PortDef::output("vec", DataType::Vec2))
            .emit("vec2 {out.vec} = vec2({in.x}, {in.y});"),
    );

    registry.register(
        NodeTypeDefinition::new("vec3_construct", "Make Vec3", NodeCategory::Vector)
            .describe("Build a vec3 from components")
            .input(PortDef::input("x", DataType::Float))
            .input(PortDef::input("y", DataType::Float))
            .input(PortDef::input("z", DataType::Float))
            .output(PortDef::output("vec", DataType::Vec3))
            .emit("vec3 {out.vec} = vec3({in.x}, {in.y}, {in.z});"),
    );

    registry.register(
        NodeTypeDefinition::new("vec4_construct", "Make Vec4", NodeCategory::Vector)
            .describe("Build a vec4 from components")
            .input(PortDef::input("x", DataType::Float))
            .input(PortDef::input("y", DataType::Float))
            .input(PortDef::input("z", DataType::Float))
            .input(PortDef::input("w", DataType::Float))
            .output(PortDef::output("vec", DataType::Vec4))
            .emit("vec4 {out.vec} = vec4({in.x}, {in.y}, {in.z}, {in.w});"),
    );

    registry.register(
        NodeTypeDefinition::new("vec2_to_vec3", "Vec2 to Vec3", NodeCategory::Vector)
            .describe("Extend a vec2 with a Z component")
            .input(PortDef::input("vec2", DataType::Vec2))
            .output(PortDef::output("vec3", DataType::Vec3))
            .parameter(ParameterDef::float("z", 0.0, -10.0, 10.0))
            .emit("vec3 {out.vec3} = vec3({in.vec2}, {param.z});"),
    );

    registry.register(
        NodeTypeDefinition::new("length", "Length", NodeCategory::Vector)
            .describe("Euclidean length")
            .input(PortDef::input("vector", DataType::Vec3))
            .output(PortDef::output("length", DataType::Float))
            .emit("float {out.length} = length({in.vector});"),
    );

    registry.register(
        NodeTypeDefinition::new("normalize", "Normalize", NodeCategory::Vector)
            .describe("Unit vector in the same direction")
            .input(PortDef::input("vector", DataType::Vec3))
            .output(PortDef::output("normalized", DataType::Vec3))
            .emit("vec3 {out.normalized} = normalize({in.vector});"),
    );

    registry.register(
        NodeTypeDefinition::new("dot", "Dot Product", NodeCategory::Vector)
            .describe("Dot product of two vectors")
            .input(PortDef::input("a", DataType::Vec3))
            .input(PortDef::input("b", DataType::Vec3))
            .output(PortDef::output("result", DataType::Float))
            .emit("float {out.result} = dot({in.a}, {in.b});"),
    );

    registry.register(
        NodeTypeDefinition::new("cross", "Cross Product", NodeCategory::Vector)
            .describe("Cross product of two vectors")
            .input(PortDef::input("a", DataType::Vec3))
            .input(PortDef::input("b", DataType::Vec3))
            .output(PortDef::output("result", DataType::Vec3))
            .emit("vec3 {out.result} = cross({in.a}, {in.b});"),
    );

    registry.register(
        NodeTypeDefinition::new("distance", "Distance", NodeCategory::Vector)
            .describe("Distance between two points")
            .input(PortDef::input("a", DataType::Vec3))
            .input(PortDef::input("b", DataType::Vec3))
            .output(PortDef::output("distance", DataType::Float))
            .emit("float {out.distance} = distance({in.a}, {in.b});"),
    );

    registry.register(
        NodeTypeDefinition::new("reflect", "Reflect", NodeCategory::Vector)
            .describe("Reflect an incident vector about a normal")
            .input(PortDef::input("incident", DataType::Vec3))
            .input(PortDef::input("normal", DataType::Vec3))
            .output(PortDef::output("reflected", DataType::Vec3))
            .emit("vec3 {out.reflected} = reflect({in.incident}, {in.normal});"),
    );

    // ========================================================================
    // Color Nodes
    // ========================================================================

    registry.register(
        NodeTypeDefinition::new("rgb_to_hsv", "RGB to HSV", NodeCategory::Color)
            .describe("Convert RGB to hue, saturation, value")
            .input(PortDef::input("rgb", DataType::Color))
            .output(PortDef::output("hsv", DataType::Vec3))
            .emit("vec3 {out.hsv} = rgbToHsv({in.rgb});")
            .helper("rgbToHsv"),
    );

    registry.register(
        NodeTypeDefinition::new("hsv_to_rgb", "HSV to RGB", NodeCategory::Color)
            .describe("Convert hue, saturation, value to RGB")
            .input(PortDef::input("hsv", DataType::Vec3))
            .output(PortDef::output("rgb", DataType::Color))
            .emit("vec3 {out.rgb} = hsvToRgb({in.hsv});")
            .helper("hsvToRgb"),
    );

    registry.register(
        NodeTypeDefinition::new("color_picker", "Color", NodeCategory::Color)
            .describe("Constant color")
            .output(PortDef::output("color", DataType::Color))
            .parameter(ParameterDef::color("color", [1.0, 0.0, 0.0]))
            .emit("vec3 {out.color} = {param.color};"),
    );

    registry.register(
        NodeTypeDefinition::new("mix_colors", "Mix Colors", NodeCategory::Color)
            .describe("Blend two colors")
            .input(PortDef::input("colorA", DataType::Color))
            .input(PortDef::input("colorB", DataType::Color))
            .input(PortDef::input("factor", DataType::Float).with_default(Literal::Float(0.5)))
            .output(PortDef::output("result", DataType::Color))
            .emit("vec3 {out.result} = mix({in.colorA}, {in.colorB}, {in.factor});"),
    );

    // ========================================================================
    // Output Nodes
    // ========================================================================

    registry.register(
        NodeTypeDefinition::new("fragment_output", "Fragment Output", NodeCategory::Output)
            .describe("Final fragment color")
            .input(PortDef::input("color", DataType::Color))
            .emit("{result} = vec4({in.color}, 1.0);"),
    );

    registry
}

fn binary(id: &str, label: &str, description: &str, expression: &str) -> NodeTypeDefinition {
    NodeTypeDefinition::new(id, label, NodeCategory::Operation)
        .describe(description)
        .input(PortDef::input("a", DataType::Float))
        .input(PortDef::input("b", DataType::Float))
        .output(PortDef::output("result", DataType::Float))
        .emit(format!("float {{out.result}} = {expression};"))
}

fn unary(id: &str, label: &str, expression: &str) -> NodeTypeDefinition {
    NodeTypeDefinition::new(id, label, NodeCategory::Operation)
        .describe(label)
        .input(PortDef::input("value", DataType::Float))
        .output(PortDef::output("result", DataType::Float))
        .emit(format!("float {{out.result}} = {expression};"))
}

fn noise(id: &str, label: &str, output: &str, function: &str) -> NodeTypeDefinition {
    NodeTypeDefinition::new(id, label, NodeCategory::Utility)
        .describe(format!("{label} sampled at a 2D coordinate"))
        .input(PortDef::input("coord", DataType::Vec2))
        .output(PortDef::output(output, DataType::Float))
        .parameter(ParameterDef::float("scale", 1.0, 0.1, 10.0))
        .emit(format!("float {{out.{output}}} = {function}({{in.coord}} * {{param.scale}});"))
        .helper(function)
}

fn split(id: &str, label: &str, data_type: DataType, components: &[&str]) -> NodeTypeDefinition {
    NodeTypeDefinition::new(id, label, NodeCategory::Utility)
        .describe("Extract one component")
        .input(PortDef::input("vec", data_type))
        .output(PortDef::output("component", DataType::Float))
        .parameter(ParameterDef::select("component", "x", components))
        .emit("float {out.component} = {in.vec}.{param.component};")
}
