//! Self-contained HTML rendering of a population graph.
//!
//! The page embeds two JSON arrays: `users` (`{name, version}`) and `graph`
//! (`{source, target}` indices into `users`). A small force simulation lays
//! the users out on a canvas and colours them by version.

use std::collections::HashMap;
use std::io::{self, Write};

use infection_core::Population;
use serde::Serialize;
use thiserror::Error;

const PAGE_HEAD: &str = r##"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<title>Infection graph</title>
<style>
  html, body { margin: 0; height: 100%; background: #fafafa; font: 13px sans-serif; }
  canvas { display: block; width: 100%; height: 100%; }
  #legend { position: fixed; top: 8px; left: 8px; background: #fffd; padding: 6px 10px; }
</style>
</head>
<body>
<div id="legend"></div>
<canvas id="graph"></canvas>
<script>
const users = "##;

const PAGE_MIDDLE: &str = ";\nconst graph = ";

const PAGE_TAIL: &str = r##";

const canvas = document.getElementById("graph");
const context = canvas.getContext("2d");
const versions = [...new Set(users.map((user) => user.version))].sort((a, b) => a - b);
const colour = (version) =>
  `hsl(${(versions.indexOf(version) * 137) % 360}, 65%, 50%)`;

document.getElementById("legend").innerHTML = versions
  .map((version) => `<span style="color:${colour(version)}">&#9679;</span> v${version}`)
  .join("&nbsp;&nbsp;");

const nodes = users.map((user, index) => ({
  ...user,
  x: Math.cos(index) * 200 * Math.random(),
  y: Math.sin(index) * 200 * Math.random(),
  vx: 0,
  vy: 0,
}));

function resize() {
  canvas.width = canvas.clientWidth;
  canvas.height = canvas.clientHeight;
}

function step() {
  for (const a of nodes) {
    for (const b of nodes) {
      if (a === b) continue;
      const dx = a.x - b.x;
      const dy = a.y - b.y;
      const distance = Math.max(Math.hypot(dx, dy), 1);
      const push = 400 / (distance * distance);
      a.vx += (dx / distance) * push;
      a.vy += (dy / distance) * push;
    }
    a.vx -= a.x * 0.002;
    a.vy -= a.y * 0.002;
  }
  for (const link of graph) {
    const source = nodes[link.source];
    const target = nodes[link.target];
    const dx = target.x - source.x;
    const dy = target.y - source.y;
    const pull = (Math.hypot(dx, dy) - 40) * 0.01;
    source.vx += dx * pull * 0.05;
    source.vy += dy * pull * 0.05;
    target.vx -= dx * pull * 0.05;
    target.vy -= dy * pull * 0.05;
  }
  for (const node of nodes) {
    node.vx *= 0.6;
    node.vy *= 0.6;
    node.x += node.vx;
    node.y += node.vy;
  }
}

function draw() {
  context.clearRect(0, 0, canvas.width, canvas.height);
  context.save();
  context.translate(canvas.width / 2, canvas.height / 2);
  context.strokeStyle = "#9996";
  for (const link of graph) {
    const source = nodes[link.source];
    const target = nodes[link.target];
    context.beginPath();
    context.moveTo(source.x, source.y);
    context.lineTo(target.x, target.y);
    context.stroke();
  }
  for (const node of nodes) {
    context.fillStyle = colour(node.version);
    context.beginPath();
    context.arc(node.x, node.y, 5, 0, 2 * Math.PI);
    context.fill();
    context.fillStyle = "#333";
    context.fillText(node.name, node.x + 7, node.y + 4);
  }
  context.restore();
}

let ticks = 0;
function frame() {
  step();
  draw();
  if (++ticks < 600) requestAnimationFrame(frame);
}

window.addEventListener("resize", () => { resize(); draw(); });
resize();
frame();
</script>
</body>
</html>
"##;

/// Errors raised while rendering the visualisation.
#[derive(Debug, Error)]
pub enum VisualizeError {
    /// Serialising the embedded data failed.
    #[error("failed to serialise graph data: {0}")]
    Json(#[from] serde_json::Error),
    /// Writing the page failed.
    #[error("failed to write visualisation: {0}")]
    Io(#[from] io::Error),
}

/// User entry embedded in the page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserNode<'a> {
    /// User identifier.
    pub name: &'a str,
    /// Current version.
    pub version: u64,
}

/// Directed edge between two entries of the `users` array.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Link {
    /// Index of the edge source.
    pub source: usize,
    /// Index of the edge target.
    pub target: usize,
}

/// Users in identifier order and every stored edge as index pairs.
///
/// # Examples
/// ```
/// use infection_cli::visualize::{Link, graph_data};
/// use infection_core::{Population, UserGraph, UserVersions};
///
/// let versions = UserVersions::from([("A".to_owned(), 0), ("B".to_owned(), 2)]);
/// let graph = UserGraph::from([("B".to_owned(), vec!["A".to_owned()])]);
/// let population = Population::load(versions, graph)?;
///
/// let (users, links) = graph_data(&population);
/// assert_eq!(users[1].version, 2);
/// assert_eq!(links, [Link { source: 1, target: 0 }]);
/// # Ok::<(), infection_core::InfectionError>(())
/// ```
#[must_use]
pub fn graph_data(population: &Population) -> (Vec<UserNode<'_>>, Vec<Link>) {
    let users: Vec<UserNode<'_>> = population
        .user_versions()
        .into_iter()
        .map(|(name, version)| UserNode { name, version })
        .collect();
    let index: HashMap<&str, usize> = users
        .iter()
        .enumerate()
        .map(|(position, user)| (user.name, position))
        .collect();
    let links = population
        .user_edges()
        .into_iter()
        .filter_map(|(from, to)| {
            Some(Link {
                source: *index.get(from)?,
                target: *index.get(to)?,
            })
        })
        .collect();
    (users, links)
}

/// Writes the visualisation page for `population` to `writer`.
///
/// # Errors
/// Returns [`VisualizeError`] if serialisation or writing fails.
pub fn render_html(population: &Population, mut writer: impl Write) -> Result<(), VisualizeError> {
    let (users, links) = graph_data(population);
    let users = script_json(&users)?;
    let links = script_json(&links)?;
    for part in [PAGE_HEAD, &users, PAGE_MIDDLE, &links, PAGE_TAIL] {
        writer.write_all(part.as_bytes())?;
    }
    Ok(())
}

/// Serialises `value` for inclusion inside a `<script>` element.
fn script_json<T: Serialize + ?Sized>(value: &T) -> Result<String, serde_json::Error> {
    // `<` only occurs inside JSON strings, where `\u003c` is equivalent.
    Ok(serde_json::to_string(value)?.replace('<', "\\u003c"))
}
