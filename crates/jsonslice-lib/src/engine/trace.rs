//! Instrumentation hooks for materializer traversals.
//!
//! # Zero-cost by default
//!
//! `NoopTracer` methods are `#[inline(always)]` and empty, so a traversal
//! monomorphized with it carries no tracing code. `PrintTracer` renders an
//! indented, human-readable trace for the CLI; `LogTracer` forwards events
//! to the `tracing` ecosystem.

use jsonslice_core::{ChildSlot, Colors, DocumentError, Node, Scalar};

/// Verbosity level for trace output.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Verbosity {
    /// Containers, cache hits, suspend/resume.
    #[default]
    Default,
    /// Every node, kind only.
    Verbose,
    /// Every node, with scalar values.
    VeryVerbose,
}

/// Traversal instrumentation.
///
/// Depth is the frame stack depth of the node, the root being 0.
pub trait Tracer {
    /// A node was constructed and attached.
    fn trace_node(&mut self, depth: usize, slot: Option<ChildSlot>, node: Node<'_>);

    /// A live cached value was reused for a container; no descent follows.
    fn trace_cache_hit(&mut self, depth: usize, slot: Option<ChildSlot>, node: Node<'_>);

    /// The slice expired with `depth + 1` frames still on the stack.
    fn trace_suspend(&mut self, depth: usize, nodes: usize);

    fn trace_resume(&mut self, depth: usize);

    fn trace_done(&mut self, nodes: usize);

    fn trace_failed(&mut self, error: &DocumentError);
}

/// No-op tracer that gets optimized away completely.
pub struct NoopTracer;

impl Tracer for NoopTracer {
    #[inline(always)]
    fn trace_node(&mut self, _depth: usize, _slot: Option<ChildSlot>, _node: Node<'_>) {}

    #[inline(always)]
    fn trace_cache_hit(&mut self, _depth: usize, _slot: Option<ChildSlot>, _node: Node<'_>) {}

    #[inline(always)]
    fn trace_suspend(&mut self, _depth: usize, _nodes: usize) {}

    #[inline(always)]
    fn trace_resume(&mut self, _depth: usize) {}

    #[inline(always)]
    fn trace_done(&mut self, _nodes: usize) {}

    #[inline(always)]
    fn trace_failed(&mut self, _error: &DocumentError) {}
}

/// Tracer forwarding events to `tracing` at trace/debug level.
pub struct LogTracer;

impl Tracer for LogTracer {
    fn trace_node(&mut self, depth: usize, _slot: Option<ChildSlot>, node: Node<'_>) {
        tracing::trace!(depth, node = node.id().as_u32(), "visit");
    }

    fn trace_cache_hit(&mut self, depth: usize, _slot: Option<ChildSlot>, node: Node<'_>) {
        tracing::trace!(depth, node = node.id().as_u32(), "cache hit");
    }

    fn trace_suspend(&mut self, depth: usize, nodes: usize) {
        tracing::trace!(depth, nodes, "suspend");
    }

    fn trace_resume(&mut self, depth: usize) {
        tracing::trace!(depth, "resume");
    }

    fn trace_done(&mut self, nodes: usize) {
        tracing::debug!(nodes, "traversal done");
    }

    fn trace_failed(&mut self, error: &DocumentError) {
        tracing::debug!(%error, "traversal failed");
    }
}

/// Tracer that collects an indented trace for display.
pub struct PrintTracer {
    verbosity: Verbosity,
    colors: Colors,
    lines: Vec<String>,
}

impl PrintTracer {
    pub fn new(verbosity: Verbosity, colors: Colors) -> Self {
        Self {
            verbosity,
            colors,
            lines: Vec::new(),
        }
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    /// Print all trace lines.
    pub fn print(&self) {
        for line in &self.lines {
            println!("{line}");
        }
    }

    fn add_node(&mut self, depth: usize, slot: Option<ChildSlot>, node: Node<'_>, note: &str) {
        let c = self.colors;
        let mut line = " ".repeat(depth * 2);

        match slot {
            Some(ChildSlot::Index(i)) => {
                line.push_str(&format!("{}[{i}]{} ", c.punct, c.reset));
            }
            Some(ChildSlot::Key(key)) => {
                let key = node.document().key(key).map_or_else(|_| "?".to_owned(), quote);
                line.push_str(&format!("{}{key}{}{}:{} ", c.key, c.reset, c.punct, c.reset));
            }
            None => {}
        }

        match node.kind() {
            Ok(kind) => line.push_str(kind.as_str()),
            Err(_) => line.push('?'),
        }
        line.push_str(&format!(" {}{}{}", c.literal, node.id(), c.reset));

        if self.verbosity == Verbosity::VeryVerbose
            && let Ok(scalar) = node.scalar()
        {
            line.push(' ');
            line.push_str(&format_scalar(scalar, &c));
        }
        line.push_str(note);
        self.lines.push(line);
    }

    fn add_control(&mut self, text: String) {
        let c = self.colors;
        self.lines.push(format!("{}~{} {text}", c.punct, c.reset));
    }
}

impl Tracer for PrintTracer {
    fn trace_node(&mut self, depth: usize, slot: Option<ChildSlot>, node: Node<'_>) {
        let container = node.kind().is_ok_and(|k| k.is_container());
        if !container && self.verbosity == Verbosity::Default {
            return;
        }
        self.add_node(depth, slot, node, "");
    }

    fn trace_cache_hit(&mut self, depth: usize, slot: Option<ChildSlot>, node: Node<'_>) {
        self.add_node(depth, slot, node, " (cached)");
    }

    fn trace_suspend(&mut self, depth: usize, nodes: usize) {
        self.add_control(format!("suspended at depth {depth} after {nodes} nodes"));
    }

    fn trace_resume(&mut self, depth: usize) {
        self.add_control(format!("resumed at depth {depth}"));
    }

    fn trace_done(&mut self, nodes: usize) {
        self.add_control(format!("done, {nodes} nodes"));
    }

    fn trace_failed(&mut self, error: &DocumentError) {
        self.add_control(format!("failed: {error}"));
    }
}

fn format_scalar(scalar: Scalar<'_>, c: &Colors) -> String {
    match scalar {
        Scalar::Null => format!("{}null{}", c.literal, c.reset),
        Scalar::Bool(b) => b.to_string(),
        Scalar::Int(n) => n.to_string(),
        Scalar::UInt(n) => n.to_string(),
        Scalar::Float(n) => n.to_string(),
        Scalar::Str(s) => format!("{}{}{}", c.string, quote(s), c.reset),
    }
}

fn quote(s: &str) -> String {
    serde_json::to_string(s).unwrap_or_else(|_| format!("{s:?}"))
}
