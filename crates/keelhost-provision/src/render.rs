//! Engine unit file rendering

use std::fmt::Write as _;

use tera::{Context, Tera};

use crate::error::RenderError;
use crate::options::{AuthOptions, EngineOptions};

const TEMPLATE_NAME: &str = "docker.service";
const TEMPLATE: &str = include_str!("../templates/docker.service.tera");

/// Render the systemd unit for the Docker engine.
///
/// Pure: no I/O, and identical inputs give byte-identical output. Every list
/// in `engine` becomes one flag per entry, in input order. Environment
/// entries are double-quoted individually.
///
/// # Errors
/// Returns `RenderError::Template` if the embedded template is malformed
pub fn render_engine_config(
    engine: &EngineOptions,
    auth: &AuthOptions,
    docker_port: u16,
) -> Result<String, RenderError> {
    let mut tera = Tera::default();
    tera.autoescape_on(Vec::new());
    tera.add_raw_template(TEMPLATE_NAME, TEMPLATE)?;

    let environment: Vec<String> = engine.env.iter().map(|v| quote(v)).collect();

    let mut context = Context::new();
    context.insert("docker_port", &docker_port);
    context.insert("engine", engine);
    context.insert("auth", auth);
    context.insert("environment", &environment);

    let rendered = tera.render(TEMPLATE_NAME, &context)?;

    tracing::trace!(bytes = rendered.len(), "rendered engine unit");
    Ok(rendered)
}

/// Double-quote `value` the way systemd's `Environment=` expects.
fn quote(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('"');
    for c in value.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            '\u{7}' => out.push_str("\\a"),
            '\u{8}' => out.push_str("\\b"),
            '\u{b}' => out.push_str("\\v"),
            '\u{c}' => out.push_str("\\f"),
            c if c.is_ascii_control() => {
                let _ = write!(out, "\\x{:02x}", u32::from(c));
            }
            c if c.is_control() => {
                let _ = write!(out, "\\u{:04x}", u32::from(c));
            }
            c => out.push(c),
        }
    }
    out.push('"');
    out
}
