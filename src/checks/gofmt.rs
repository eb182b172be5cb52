//! In-process Go formatting check using tree-sitter
//!
//! The source must parse as a Go file with a package clause. The canonical
//! form is built in two passes. The first pass works on lines only:
//!
//! - line endings are `\n`
//! - no trailing spaces or tabs
//! - no leading blank lines, no runs of more than one blank line
//! - exactly one newline at end of file
//!
//! The second pass re-parses the result and walks the syntax tree:
//!
//! - a line that starts a statement, declaration, element, case clause or
//!   closing bracket is indented with tabs, one level deeper than the line
//!   that opened the innermost bracket around it (case clauses and labels
//!   sit at the level of that line, closing brackets match it)
//! - one space before the `{` of a block or switch body
//! - one space around assignment operators
//! - binary operators are spaced by precedence and nesting depth, the way
//!   gofmt decides it (`x > 0`, `a*b + c`, `s[i+1]`)
//! - call and parameter lists have no space inside their parentheses,
//!   none before a comma and one after it
//!
//! Continuation lines inside a multi-line expression keep their indentation.
//! Lines whose newline lies inside a raw string literal are part of the
//! literal's value and are kept byte for byte.

use super::format::{FormatFailure, SourceFormatter};
use std::collections::{BTreeMap, HashMap};
use std::ops::Range;
use tree_sitter::{Node, Parser, Tree};

const NOT_FORMATTED: &str = "file is not gofmted";

/// Nodes whose direct children start lines at their own indentation level
const LINE_CONTAINERS: &[&str] = &[
    "source_file",
    "block",
    "statement_list",
    "literal_value",
    "field_declaration_list",
    "interface_type",
    "import_spec_list",
    "const_declaration",
    "var_declaration",
    "var_spec_list",
    "type_declaration",
    "argument_list",
    "parameter_list",
    "expression_switch_statement",
    "type_switch_statement",
    "select_statement",
    "expression_case",
    "default_case",
    "type_case",
    "communication_case",
];

/// Parents under which a comment line is indented like a statement
const COMMENT_CONTAINERS: &[&str] = &[
    "source_file",
    "block",
    "statement_list",
    "literal_value",
    "field_declaration_list",
    "interface_type",
    "import_spec_list",
    "const_declaration",
    "var_spec_list",
    "type_declaration",
    "argument_list",
];

const CASE_CLAUSES: &[&str] = &["expression_case", "default_case", "type_case", "communication_case"];

const EXPRESSIONS: &[&str] = &[
    "binary_expression",
    "unary_expression",
    "parenthesized_expression",
    "call_expression",
    "selector_expression",
    "type_assertion_expression",
    "index_expression",
    "slice_expression",
    "composite_literal",
    "literal_value",
];

/// Canonical-form checker for Go sources
#[derive(Debug, Clone, Default)]
pub struct GoFormatter;

impl GoFormatter {
    pub fn new() -> Self {
        Self
    }
}

impl SourceFormatter for GoFormatter {
    fn format(&self, src: &[u8]) -> Result<Vec<u8>, FormatFailure> {
        let text = std::str::from_utf8(src).map_err(|e| {
            FormatFailure::new(line_of(&src[..e.valid_up_to()]), "invalid UTF-8")
        })?;

        let tree = parse(text)?;
        let root = tree.root_node();

        if let Some(node) = first_error(root) {
            let reason = if node.is_missing() {
                format!("expected {}", node.kind())
            } else {
                "syntax error".to_string()
            };
            return Err(FormatFailure::new(node.start_position().row + 1, reason));
        }

        let has_package = root
            .children(&mut root.walk())
            .any(|child| child.kind() == "package_clause");
        if !has_package {
            return Err(FormatFailure::new(1, "expected 'package' clause"));
        }

        let mut raw_strings = Vec::new();
        collect_raw_strings(root, &mut raw_strings);
        let lines = canonicalize(text, &raw_strings);

        // line edits never touch tokens, so the second parse sees the same tree shape
        let tree = parse(&lines)?;
        Ok(TokenLayout::new(&lines, tree.root_node()).apply().into_bytes())
    }

    fn not_formatted_message(&self) -> &str {
        NOT_FORMATTED
    }
}

fn parse(text: &str) -> Result<Tree, FormatFailure> {
    let mut parser = Parser::new();
    let language = tree_sitter_go::LANGUAGE;
    parser
        .set_language(&language.into())
        .map_err(|e| FormatFailure::new(1, format!("failed to set Go language: {e}")))?;
    parser
        .parse(text, None)
        .ok_or_else(|| FormatFailure::new(1, "failed to parse Go source"))
}

/// 1-based line number of the byte following `prefix`
fn line_of(prefix: &[u8]) -> usize {
    memchr::memchr_iter(b'\n', prefix).count() + 1
}

/// Deepest-first search for the first error or missing node
fn first_error(node: Node<'_>) -> Option<Node<'_>> {
    if node.is_error() || node.is_missing() {
        return Some(node);
    }
    if !node.has_error() {
        return None;
    }
    for child in node.children(&mut node.walk()) {
        if let Some(found) = first_error(child) {
            return Some(found);
        }
    }
    Some(node)
}

fn collect_raw_strings(node: Node<'_>, out: &mut Vec<Range<usize>>) {
    if node.kind() == "raw_string_literal" {
        out.push(node.byte_range());
        return;
    }
    for child in node.children(&mut node.walk()) {
        collect_raw_strings(child, out);
    }
}

fn canonicalize(text: &str, raw_strings: &[Range<usize>]) -> String {
    let inside_raw = |pos: usize| raw_strings.iter().any(|r| r.start < pos && pos < r.end);

    let mut out = String::with_capacity(text.len() + 1);
    let mut pending_blank = false;
    let mut offset = 0;

    for segment in text.split_inclusive('\n') {
        offset += segment.len();
        let protected = segment.ends_with('\n') && inside_raw(offset - 1);

        if protected {
            if pending_blank {
                out.push('\n');
                pending_blank = false;
            }
            out.push_str(segment);
            continue;
        }

        let content = segment
            .strip_suffix('\n')
            .unwrap_or(segment)
            .trim_end_matches([' ', '\t', '\r']);
        if content.is_empty() {
            // leading blank lines are dropped, inner runs collapse to one
            pending_blank = !out.is_empty();
            continue;
        }

        if pending_blank {
            out.push('\n');
            pending_blank = false;
        }
        out.push_str(content);
        out.push('\n');
    }
    out
}

fn precedence(op: &str) -> u8 {
    match op {
        "||" => 1,
        "&&" => 2,
        "==" | "!=" | "<" | "<=" | ">" | ">=" => 3,
        "+" | "-" | "|" | "^" => 4,
        _ => 5,
    }
}

fn operator(node: Node<'_>) -> &'static str {
    node.child_by_field_name("operator")
        .map(|op| op.kind())
        .unwrap_or_default()
}

/// Which precedence classes a binary expression mixes, and the lowest
/// cutoff that keeps adjacent unary operators readable (`x / *p`, `a - -b`)
fn walk_binary(node: Node<'_>) -> (bool, bool, u8) {
    let prec = precedence(operator(node));
    let mut has4 = prec == 4;
    let mut has5 = prec == 5;
    let mut max_problem = 0;

    if let Some(left) = node.child_by_field_name("left") {
        if left.kind() == "binary_expression" && precedence(operator(left)) >= prec {
            let (h4, h5, mp) = walk_binary(left);
            has4 |= h4;
            has5 |= h5;
            max_problem = max_problem.max(mp);
        }
    }

    if let Some(right) = node.child_by_field_name("right") {
        match right.kind() {
            "binary_expression" if precedence(operator(right)) > prec => {
                let (h4, h5, mp) = walk_binary(right);
                has4 |= h4;
                has5 |= h5;
                max_problem = max_problem.max(mp);
            }
            "unary_expression" => {
                match (operator(node), operator(right)) {
                    ("/", "*") | ("&", "&") | ("&", "^") => max_problem = 5,
                    ("+", "+") | ("-", "-") => max_problem = max_problem.max(4),
                    _ => {}
                }
            }
            _ => {}
        }
    }
    (has4, has5, max_problem)
}

/// Operators with a precedence below the cutoff are surrounded by spaces
fn cutoff(node: Node<'_>, depth: u32) -> u8 {
    let (has4, has5, max_problem) = walk_binary(node);
    if max_problem > 0 {
        return max_problem + 1;
    }
    match (has4 && has5, depth == 1) {
        (true, true) => 5,
        (false, true) => 6,
        _ => 4,
    }
}

fn diff_prec(node: Node<'_>, prec: u8) -> u32 {
    if node.kind() == "binary_expression" && precedence(operator(node)) == prec {
        0
    } else {
        1
    }
}

fn reduce_depth(depth: u32) -> u32 {
    depth.saturating_sub(1).max(1)
}

fn named_children<'t>(node: Node<'t>) -> Vec<Node<'t>> {
    node.named_children(&mut node.walk())
        .filter(|child| child.kind() != "comment")
        .collect()
}

fn is_opener(kind: &str) -> bool {
    matches!(kind, "{" | "(" | "[")
}

fn is_closer(kind: &str) -> bool {
    matches!(kind, "}" | ")" | "]")
}

fn is_blank(s: &str) -> bool {
    s.bytes().all(|b| b == b' ' || b == b'\t')
}

/// Indentation and spacing edits computed from the syntax tree of a
/// line-canonical source
struct TokenLayout<'t> {
    text: &'t str,
    root: Node<'t>,
    leaves: Vec<Node<'t>>,
    by_start: HashMap<usize, usize>,
    /// Gap start -> (gap end, wanted whitespace)
    gaps: BTreeMap<usize, (usize, &'static str)>,
    reindent: Vec<(usize, usize, String)>,
}

impl<'t> TokenLayout<'t> {
    fn new(text: &'t str, root: Node<'t>) -> Self {
        let mut leaves = Vec::new();
        collect_leaves(root, text, &mut leaves);
        let by_start = leaves
            .iter()
            .enumerate()
            .map(|(i, leaf)| (leaf.start_byte(), i))
            .collect();
        Self {
            text,
            root,
            leaves,
            by_start,
            gaps: BTreeMap::new(),
            reindent: Vec::new(),
        }
    }

    fn apply(mut self) -> String {
        self.space_punctuation();
        self.visit(self.root);
        self.indent_lines();

        let mut edits = std::mem::take(&mut self.reindent);
        for (&start, &(end, want)) in &self.gaps {
            if &self.text[start..end] != want {
                edits.push((start, end, want.to_string()));
            }
        }
        edits.sort_by_key(|(start, _, _)| *start);

        let mut out = String::with_capacity(self.text.len() + 16);
        let mut pos = 0;
        for (start, end, with) in edits {
            if start < pos {
                continue;
            }
            out.push_str(&self.text[pos..start]);
            out.push_str(&with);
            pos = end;
        }
        out.push_str(&self.text[pos..]);
        out
    }

    fn leaf_index(&self, node: Node<'_>) -> Option<usize> {
        self.by_start.get(&node.start_byte()).copied()
    }

    fn kind_at(&self, i: Option<usize>) -> &'static str {
        i.and_then(|i| self.leaves.get(i))
            .map(|leaf| leaf.kind())
            .unwrap_or_default()
    }

    /// Ask for `want` between two tokens on the same line
    fn set_gap(&mut self, start: usize, end: usize, want: &'static str) {
        if start <= end && is_blank(&self.text[start..end]) {
            self.gaps.entry(start).or_insert((end, want));
        }
    }

    fn space_before(&mut self, i: usize, want: &'static str) {
        if let Some(prev) = i.checked_sub(1).map(|p| self.leaves[p]) {
            self.set_gap(prev.end_byte(), self.leaves[i].start_byte(), want);
        }
    }

    fn space_after(&mut self, i: usize, want: &'static str) {
        if let Some(next) = self.leaves.get(i + 1).copied() {
            self.set_gap(self.leaves[i].end_byte(), next.start_byte(), want);
        }
    }

    fn space_around(&mut self, node: Option<Node<'t>>, want: &'static str) {
        if let Some(i) = node.and_then(|n| self.leaf_index(n)) {
            self.space_before(i, want);
            self.space_after(i, want);
        }
    }

    /// Braces, parentheses and commas
    fn space_punctuation(&mut self) {
        for i in 0..self.leaves.len() {
            let leaf = self.leaves[i];
            let Some(parent) = leaf.parent() else {
                continue;
            };
            let prev = self.kind_at(i.checked_sub(1));
            let next = self.kind_at(Some(i + 1));

            match (leaf.kind(), parent.kind()) {
                (
                    "{",
                    "block" | "expression_switch_statement" | "type_switch_statement"
                    | "select_statement",
                ) => self.space_before(i, " "),
                // a struct or interface written on one line keeps `struct{ a int }`
                ("{", "field_declaration_list" | "interface_type")
                    if parent.start_position().row != parent.end_position().row =>
                {
                    self.space_before(i, " ")
                }
                ("(", "argument_list") => {
                    self.space_before(i, "");
                    if next != "comment" {
                        self.space_after(i, "");
                    }
                }
                ("(", "parameter_list") if next != "comment" => self.space_after(i, ""),
                (")", "argument_list" | "parameter_list") if prev != "," => {
                    self.space_before(i, "")
                }
                (",", "argument_list" | "parameter_list") => {
                    self.space_before(i, "");
                    if next != ")" {
                        self.space_after(i, " ");
                    }
                }
                _ => {}
            }
        }
    }

    fn visit_children(&mut self, node: Node<'t>) {
        for child in named_children(node) {
            self.visit(child);
        }
    }

    fn exprs(&mut self, nodes: Vec<Node<'t>>, depth: u32) {
        for node in nodes {
            self.expr(node, Some(depth));
        }
    }

    fn field_expr(&mut self, node: Node<'t>, field: &str, depth: u32) {
        if let Some(child) = node.child_by_field_name(field) {
            self.expr(child, Some(depth));
        }
    }

    fn field_visit(&mut self, node: Node<'t>, field: &str) {
        if let Some(child) = node.child_by_field_name(field) {
            self.visit(child);
        }
    }

    /// Statements fix the nesting depth of the expressions they hold
    fn visit(&mut self, node: Node<'t>) {
        match node.kind() {
            "expression_statement" | "go_statement" | "defer_statement" | "send_statement" => {
                self.exprs(named_children(node), 1)
            }
            "inc_statement" | "dec_statement" => self.exprs(named_children(node), 2),
            "return_statement" => {
                for list in named_children(node) {
                    self.exprs(named_children(list), 1);
                }
            }
            "assignment_statement" | "short_var_declaration" => {
                let op = node
                    .child_by_field_name("operator")
                    .or_else(|| child_of_kind(node, ":="));
                self.space_around(op, " ");

                let left = node.child_by_field_name("left").map(named_children).unwrap_or_default();
                let right = node.child_by_field_name("right").map(named_children).unwrap_or_default();
                let depth = if left.len() > 1 && right.len() > 1 { 2 } else { 1 };
                self.exprs(left, depth);
                self.exprs(right, depth);
            }
            "range_clause" => {
                self.space_around(child_of_kind(node, ":=").or_else(|| child_of_kind(node, "=")), " ");
                if let Some(left) = node.child_by_field_name("left") {
                    self.exprs(named_children(left), 1);
                }
                self.field_expr(node, "right", 1);
            }
            "var_spec" | "const_spec" => {
                let grouped = node
                    .parent()
                    .is_some_and(|p| p.kind() == "var_spec_list" || child_of_kind(p, "(").is_some());
                if let Some(i) = child_of_kind(node, "=").and_then(|eq| self.leaf_index(eq)) {
                    // grouped specs align their `=` with padding
                    if !grouped {
                        self.space_before(i, " ");
                    }
                    self.space_after(i, " ");
                }
                if let Some(values) = node.child_by_field_name("value") {
                    self.exprs(named_children(values), 1);
                }
            }
            "if_statement" => {
                self.field_visit(node, "initializer");
                self.field_expr(node, "condition", 1);
                self.field_visit(node, "consequence");
                self.field_visit(node, "alternative");
            }
            "for_statement" => {
                for child in named_children(node) {
                    match child.kind() {
                        "for_clause" => {
                            self.field_visit(child, "initializer");
                            self.field_expr(child, "condition", 1);
                            self.field_visit(child, "update");
                        }
                        "range_clause" | "block" => self.visit(child),
                        _ => self.expr(child, Some(1)),
                    }
                }
            }
            "expression_switch_statement" => {
                self.field_visit(node, "initializer");
                self.field_expr(node, "value", 1);
                for child in named_children(node) {
                    if CASE_CLAUSES.contains(&child.kind()) {
                        self.visit(child);
                    }
                }
            }
            "expression_case" => {
                if let Some(values) = node.child_by_field_name("value") {
                    self.exprs(named_children(values), 1);
                }
                for child in named_children(node) {
                    if child.kind() == "statement_list" {
                        self.visit(child);
                    }
                }
            }
            kind if EXPRESSIONS.contains(&kind) => self.expr(node, None),
            _ => self.visit_children(node),
        }
    }

    /// `depth` is `None` when the enclosing context is not one whose depth
    /// is known; only operators that are always spaced are then fixed
    fn expr(&mut self, node: Node<'t>, depth: Option<u32>) {
        match node.kind() {
            "binary_expression" => self.binary(node, depth),
            "parenthesized_expression" => {
                for inner in named_children(node) {
                    let depth = if inner.kind() == "parenthesized_expression" {
                        depth
                    } else {
                        depth.map(reduce_depth)
                    };
                    self.expr(inner, depth);
                }
            }
            "unary_expression" => {
                if let Some(operand) = node.child_by_field_name("operand") {
                    self.expr(operand, depth);
                }
            }
            "call_expression" => {
                let args = node
                    .child_by_field_name("arguments")
                    .map(named_children)
                    .unwrap_or_default();
                let depth = if args.len() > 1 { depth.map(|d| d + 1) } else { depth };
                if let Some(function) = node.child_by_field_name("function") {
                    self.expr(function, depth);
                }
                self.field_visit(node, "type_arguments");
                for arg in args {
                    if arg.kind() == "variadic_argument" {
                        for inner in named_children(arg) {
                            self.expr(inner, depth);
                        }
                    } else {
                        self.expr(arg, depth);
                    }
                }
            }
            "selector_expression" | "type_assertion_expression" => {
                if let Some(operand) = node.child_by_field_name("operand") {
                    self.expr(operand, depth);
                }
                self.field_visit(node, "type");
            }
            "index_expression" => {
                if let Some(operand) = node.child_by_field_name("operand") {
                    self.expr(operand, Some(1));
                }
                if let Some(index) = node.child_by_field_name("index") {
                    self.expr(index, depth.map(|d| d + 1));
                }
            }
            "slice_expression" => {
                if let Some(operand) = node.child_by_field_name("operand") {
                    self.expr(operand, Some(1));
                }
                for field in ["start", "end", "capacity"] {
                    if let Some(index) = node.child_by_field_name(field) {
                        self.expr(index, depth.map(|d| d + 1));
                    }
                }
            }
            "composite_literal" => {
                self.field_visit(node, "type");
                if let Some(body) = node.child_by_field_name("body") {
                    self.literal_value(body);
                }
            }
            "literal_value" => self.literal_value(node),
            _ => self.visit_children(node),
        }
    }

    fn binary(&mut self, node: Node<'t>, depth: Option<u32>) {
        let (Some(left), Some(op), Some(right)) = (
            node.child_by_field_name("left"),
            node.child_by_field_name("operator"),
            node.child_by_field_name("right"),
        ) else {
            return self.visit_children(node);
        };

        let prec = precedence(op.kind());
        // comparisons and logical operators sit below every possible cutoff
        let spaced = if prec <= 3 {
            Some(true)
        } else {
            depth.map(|d| prec < cutoff(node, d))
        };

        self.expr(left, depth.map(|d| d + diff_prec(left, prec)));
        if let Some(spaced) = spaced {
            self.space_around(Some(op), if spaced { " " } else { "" });
        }
        self.expr(right, depth.map(|d| d + 1));
    }

    fn literal_value(&mut self, node: Node<'t>) {
        for child in named_children(node) {
            match child.kind() {
                "literal_element" => self.literal_element(child),
                "keyed_element" => {
                    for part in named_children(child) {
                        self.literal_element(part);
                    }
                }
                _ => self.visit(child),
            }
        }
    }

    fn literal_element(&mut self, node: Node<'t>) {
        if node.kind() != "literal_element" {
            return self.expr(node, Some(1));
        }
        for child in named_children(node) {
            if child.kind() == "literal_value" {
                self.literal_value(child);
            } else {
                self.expr(child, Some(1));
            }
        }
    }

    /// Re-indent every line whose first token starts a statement-like
    /// node or closes a bracket
    fn indent_lines(&mut self) {
        let text = self.text;
        let line_starts: Vec<usize> = std::iter::once(0)
            .chain(memchr::memchr_iter(b'\n', text.as_bytes()).map(|p| p + 1))
            .collect();
        // final indentation per line, `None` where it is not known
        let mut indents: Vec<Option<String>> = vec![None; line_starts.len()];
        let mut open: Vec<usize> = Vec::new();
        let mut last_row = None;

        for i in 0..self.leaves.len() {
            let leaf = self.leaves[i];
            let row = leaf.start_position().row;

            if last_row != Some(row) {
                last_row = Some(row);
                if let Some(&line_start) = line_starts.get(row) {
                    let current = &text[line_start..leaf.start_byte()];
                    if is_blank(current) {
                        let indent = match self.wanted_indent(i, &open, &indents) {
                            Some(want) => {
                                if want != current {
                                    self.reindent
                                        .push((line_start, leaf.start_byte(), want.clone()));
                                }
                                want
                            }
                            None => current.to_string(),
                        };
                        indents[row] = Some(indent);
                    }
                }
            }

            if is_opener(leaf.kind()) {
                open.push(row);
            } else if is_closer(leaf.kind()) {
                open.pop();
            }
        }
    }

    fn wanted_indent(&self, i: usize, open: &[usize], indents: &[Option<String>]) -> Option<String> {
        let leaf = self.leaves[i];
        if is_closer(leaf.kind()) {
            return indents.get(*open.last()?)?.clone();
        }

        let (node, parent) = anchor(leaf)?;
        if leaf.kind() == "comment" && !self.comment_is_anchored(i, parent) {
            return None;
        }
        let Some(&opener_row) = open.last() else {
            return Some(String::new());
        };
        let outer = indents.get(opener_row)?.clone()?;

        let outdented = node.kind() == "labeled_statement"
            || (CASE_CLAUSES.contains(&parent.kind()) && parent.start_byte() == leaf.start_byte());
        Some(if outdented { outer } else { outer + "\t" })
    }

    fn comment_is_anchored(&self, i: usize, parent: Node<'_>) -> bool {
        if !COMMENT_CONTAINERS.contains(&parent.kind()) {
            return false;
        }
        let next = self.leaves[i + 1..].iter().find(|leaf| leaf.kind() != "comment");
        !matches!(next.map(|leaf| leaf.kind()), Some("case" | "default"))
    }
}

/// The node a line's first token starts, together with the container it
/// is a direct child of. `None` when the token continues a node that
/// began on an earlier line.
fn anchor(leaf: Node<'_>) -> Option<(Node<'_>, Node<'_>)> {
    let start = leaf.start_byte();
    let mut node = leaf;
    while let Some(parent) = node.parent() {
        if LINE_CONTAINERS.contains(&parent.kind()) {
            return Some((node, parent));
        }
        if parent.start_byte() != start {
            return None;
        }
        node = parent;
    }
    None
}

fn child_of_kind<'t>(node: Node<'t>, kind: &str) -> Option<Node<'t>> {
    node.children(&mut node.walk()).find(|child| child.kind() == kind)
}

/// Tokens in source order, without the newline terminators
fn collect_leaves<'t>(node: Node<'t>, text: &str, out: &mut Vec<Node<'t>>) {
    if node.child_count() == 0 {
        let token = &text[node.byte_range()];
        if !token.is_empty() && !token.bytes().all(|b| b == b'\n' || b == b'\r' || b == 0) {
            out.push(node);
        }
        return;
    }
    for child in node.children(&mut node.walk()) {
        collect_leaves(child, text, out);
    }
}
