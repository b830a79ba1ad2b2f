//! Draws a small scene of unrelated shape types through one collection.
//!
//! The scene mixes three ways of drawing a stored value:
//! - the value's own [`Draw`] implementation,
//! - a named strategy type shared by several shape types,
//! - a one-off closure.
//!
//! # Running this Example
//!
//! ```bash
//! cargo run --example shapes
//! ```

use core::fmt::Write;

use polyshape::prelude::*;

#[derive(Clone, Copy, Debug)]
enum Color {
    Red,
    Green,
    Blue,
}

impl Color {
    fn rgb(self) -> u32 {
        match self {
            Color::Red => 0xFF0000,
            Color::Green => 0x00FF00,
            Color::Blue => 0x0000FF,
        }
    }

    fn name(self) -> &'static str {
        match self {
            Color::Red => "red",
            Color::Green => "green",
            Color::Blue => "blue",
        }
    }
}

impl core::fmt::Display for Color {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{} (0x{:06X})", self.name(), self.rgb())
    }
}

#[derive(Clone, Debug)]
struct Circle {
    radius: f64,
}

impl Draw for Circle {
    fn draw(&self, canvas: &mut dyn Write) -> core::fmt::Result {
        writeln!(canvas, "circle: radius={}", self.radius)
    }
}

#[derive(Clone, Debug)]
struct Square {
    side: f64,
}

impl Draw for Square {
    fn draw(&self, canvas: &mut dyn Write) -> core::fmt::Result {
        writeln!(canvas, "square: side={}", self.side)
    }
}

// ============================================================================
// A strategy shared by every shape type
// ============================================================================

#[derive(Clone, Debug)]
struct Colored {
    color: Color,
}

impl DrawStrategy<Circle> for Colored {
    fn draw(&self, circle: &Circle, canvas: &mut dyn Write) -> core::fmt::Result {
        writeln!(canvas, "circle: radius={}, color = {}", circle.radius, self.color)
    }
}

impl DrawStrategy<Square> for Colored {
    fn draw(&self, square: &Square, canvas: &mut dyn Write) -> core::fmt::Result {
        writeln!(canvas, "square: side={}, color = {}", square.side, self.color)
    }
}

fn main() -> core::fmt::Result {
    let mut shapes = Shapes::new();
    shapes.push(Shape::new(Circle { radius: 2.3 }));
    shapes.push(Shape::with_strategy(
        Square { side: 1.2 },
        Colored {
            color: Color::Green,
        },
    ));
    shapes.push(Shape::with_strategy(
        Circle { radius: 4.1 },
        |circle: &Circle, canvas: &mut dyn Write| {
            writeln!(canvas, "circle: radius={}, color = {}", circle.radius, Color::Blue)
        },
    ));

    let mut canvas = String::new();
    draw_all(&shapes, &mut canvas)?;
    print!("{canvas}");

    // Copies are independent of the scene they came from
    let mut variant = shapes.clone();
    variant.push(Shape::with_strategy(
        Square { side: 0.5 },
        Colored { color: Color::Red },
    ));
    drop(shapes);

    println!("---");
    print!("{variant}");
    Ok(())
}
