//! Places the same shapes in each of the built-in storages.
//!
//! Pool events are logged through `tracing`, so run with the subscriber
//! installed below to watch blocks being taken and returned.
//!
//! # Running this Example
//!
//! ```bash
//! cargo run --example storage_policies
//! ```

use core::fmt::Write;

use polyshape::{
    AllocationError,
    prelude::*,
    storage::{Align8, PooledShape},
};

#[derive(Clone, Debug)]
struct Triangle {
    base: f64,
    height: f64,
}

impl Draw for Triangle {
    fn draw(&self, canvas: &mut dyn Write) -> core::fmt::Result {
        writeln!(canvas, "triangle: base={}, height={}", self.base, self.height)
    }
}

#[derive(Clone, Debug)]
struct Polyline {
    points: Vec<(i32, i32)>,
}

impl Draw for Polyline {
    fn draw(&self, canvas: &mut dyn Write) -> core::fmt::Result {
        write!(canvas, "polyline:")?;
        for (x, y) in &self.points {
            write!(canvas, " ({x}, {y})")?;
        }
        writeln!(canvas)
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::TRACE)
        .init();

    // ========================================================================
    // Inline: no allocation, the adapter lives in the handle
    // ========================================================================
    let mut inline: Shapes<Inline> = Shapes::new();
    inline.push(InlineShape::inline(Triangle {
        base: 3.0,
        height: 4.0,
    }));
    inline.push(InlineShape::inline(Polyline {
        points: vec![(0, 0), (1, 1), (2, 0)],
    }));
    println!("inline, {} bytes per shape:", size_of::<InlineShape>());
    print!("{inline}");

    // Moving an inline shape relocates its bytes
    let moved = inline.pop();
    if let Some(moved) = moved {
        print!("moved: {moved}");
    }

    // ========================================================================
    // Pool: fixed blocks owned by the caller
    // ========================================================================
    let pool: Pool<Align8<48>> = Pool::new(2);
    let first: PooledShape<'_, Align8<48>> = Shape::new_in(
        &pool,
        Triangle {
            base: 1.0,
            height: 1.0,
        },
    );
    let second = first.clone();
    println!("pool: {pool:?}");

    match Shape::try_new_in(&pool, Triangle { base: 2.0, height: 2.0 }) {
        Ok(_) => println!("unexpected free block"),
        Err(report) => {
            if let AllocationError::Exhausted { slots } = report.current_context() {
                println!("pool of {slots} blocks is full");
            }
        }
    }

    // Moving out of the pool frees the block
    let escaped = second.into_heap();
    print!("escaped: {escaped}");
    println!("pool: {pool:?}");
    drop(first);

    // ========================================================================
    // Heap: any size, one allocation per shape
    // ========================================================================
    let heap: Shapes = inline.into_iter().map(Shape::into_heap).collect();
    print!("heap: {heap}");
}
