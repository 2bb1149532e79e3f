//! A small scatter plot with a smoothed trend line, painted with Vello.
//!
//! Run with `RUST_LOG=debug` to watch selections being instantiated and
//! flushed. Pointer input is simulated: a hover over the first point, a
//! click on the checkbox, and a lasso drag.

use kurbo::Point;
use vbind_core::curve;
use vbind_render::VelloBackend;
use vbind_select::{CheckBox, Config, Context, LassoEvent, PointerButton, PointerEvent, Value};

#[derive(Debug)]
struct Sample {
    day: f64,
    temperature: f64,
}

fn main() {
    env_logger::init();

    let config = Config::from_json(r#"{ "width": 640, "height": 480, "zoom_enabled": true }"#)
        .unwrap_or_else(|e| {
            log::warn!("bad config ({e}), using defaults");
            Config::default()
        });
    let ctx = Context::new(config, VelloBackend::new());

    let samples: Vec<Sample> = (0..12)
        .map(|i| Sample {
            day: i as f64,
            temperature: 10.0 + (i as f64 * 0.6).sin() * 8.0,
        })
        .collect();
    let plot = |s: &Sample| Point::new(s.day * 40.0 - 220.0, s.temperature * 10.0 - 100.0);
    let trend = curve(&samples.iter().map(plot).collect::<Vec<_>>());

    let dots = ctx.select_all::<Sample>();
    dots.data(samples)
        .append("circle")
        .attr("x", Value::computed(move |s: &Sample, _| plot(s).x))
        .attr("y", Value::computed(move |s: &Sample, _| plot(s).y))
        .attr("r", 6)
        .style("fill", "steelblue")
        .on("mouseover", |s, i, _| log::info!("point {i}: day {} at {:.1}°", s.day, s.temperature))
        .on("mouseout", |_, i, _| log::info!("left point {i}"));

    let line = ctx.select_all::<()>();
    line.data([()])
        .append("path")
        .attr("d", trend)
        .style("stroke", "#ff8000")
        .style("stroke-width", 2);

    let labels = ctx.select_all::<&'static str>();
    labels
        .data(["cold", "warm"])
        .append("text")
        .attr("x", Value::computed(|_: &&'static str, i| -200.0 + i as f64 * 400.0))
        .attr("y", 200)
        .text(Value::computed(|s: &&'static str, _| s.to_string()))
        .style("font-size", 15)
        .style("fill", "gray");

    let toggle = CheckBox::new(&ctx);
    toggle
        .attr("x", 280.0)
        .attr("y", 200.0)
        .on_change(|on| log::info!("trend line {}", if on { "highlighted" } else { "normal" }));

    ctx.on_lasso(LassoEvent::End, |points| log::info!("lasso closed with {} points", points.len()));
    ctx.render();

    let first = ctx.camera().world_to_screen(Point::new(-220.0, 0.0));
    ctx.pointer_move(&PointerEvent::at(first.x, first.y));
    ctx.pointer_move(&PointerEvent::at(0.0, 0.0));

    let check = ctx.camera().world_to_screen(Point::new(280.0, 200.0));
    ctx.pointer_click(&PointerEvent::primary(check.x, check.y));

    for step in 0..5 {
        let x = 100.0 + step as f64 * 20.0;
        let ev = PointerEvent::with_button(x, 100.0, PointerButton::Middle);
        match step {
            0 => ctx.pointer_press(&ev),
            4 => ctx.pointer_release(&ev),
            _ => ctx.pointer_move(&ev),
        }
    }

    ctx.wheel(250.0);
    if let Some((frames, attached)) = ctx.inspect(|s| (s.frames(), s.attached_count())) {
        log::info!("{frames} frames drawn, {attached} primitives attached");
    }
}
