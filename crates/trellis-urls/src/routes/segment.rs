use super::{AssembleOptions, Route, decode, encode, remainder, value_to_string};
use crate::{Params, Result, RouteMatch, RoutingError};
use serde_json::Value;
use std::collections::HashMap;

/// Template node produced by the segment parser.
#[derive(Debug, Clone, PartialEq)]
enum Node {
	Literal(String),
	Parameter {
		name: String,
		delimiters: Option<String>,
	},
	Optional(Vec<Node>),
}

/// Matches `/name/:placeholder[/:optional]` style templates.
///
/// - `:name` binds one segment (`[^/]+`), or `[^<delims>]+` for `:name{delims}`.
/// - `[...]` marks an optional part; optional parts nest.
/// - `\` escapes the next character.
///
/// Per-placeholder constraints replace the default segment pattern and are
/// checked both when matching and when assembling.
#[derive(Debug, Clone)]
pub struct Segment {
	template: String,
	nodes: Vec<Node>,
	regex: regex::Regex,
	groups: Vec<(String, String)>,
	constraints: HashMap<String, regex::Regex>,
	defaults: Params,
}

impl Segment {
	/// Compiles a template without constraints or defaults.
	///
	/// # Errors
	///
	/// Returns [`RoutingError::InvalidPattern`] for unbalanced brackets,
	/// empty placeholder names or a template that does not compile.
	pub fn new(template: &str) -> Result<Self> {
		Self::with_options(template, HashMap::new(), Params::new())
	}

	/// Compiles a template with constraints and default values.
	///
	/// # Examples
	///
	/// ```
	/// use std::collections::HashMap;
	/// use trellis_urls::{Params, Route, Segment};
	/// use serde_json::json;
	///
	/// let mut constraints = HashMap::new();
	/// constraints.insert("id".to_string(), "[0-9]+".to_string());
	/// let mut defaults = Params::new();
	/// defaults.insert("page".to_string(), json!("1"));
	///
	/// let route = Segment::with_options("/posts/:id[/page/:page]", constraints, defaults).unwrap();
	///
	/// let m = route.match_path("/posts/42", 0).unwrap();
	/// assert_eq!(m.param("id"), Some(&json!("42")));
	/// assert_eq!(m.param("page"), Some(&json!("1")));
	/// assert!(route.match_path("/posts/abc", 0).is_none());
	/// ```
	pub fn with_options(
		template: &str,
		constraints: HashMap<String, String>,
		defaults: Params,
	) -> Result<Self> {
		let nodes = parse(template)?;

		let mut compiled = HashMap::with_capacity(constraints.len());
		for (name, pattern) in &constraints {
			let anchored = regex::Regex::new(&format!("^(?:{pattern})$")).map_err(|e| {
				RoutingError::InvalidPattern {
					pattern: pattern.clone(),
					message: e.to_string(),
				}
			})?;
			compiled.insert(name.clone(), anchored);
		}

		let mut groups = Vec::new();
		let body = build_regex(&nodes, &constraints, &mut groups);
		let regex = regex::Regex::new(&format!("^(?:{body})")).map_err(|e| {
			RoutingError::InvalidPattern {
				pattern: template.to_string(),
				message: e.to_string(),
			}
		})?;

		Ok(Self {
			template: template.to_string(),
			nodes,
			regex,
			groups,
			constraints: compiled,
			defaults,
		})
	}

	pub fn template(&self) -> &str {
		&self.template
	}

	/// Builds the path for `nodes`. Optional parts collapse to an empty string
	/// when every placeholder in them is unset or equal to its default.
	fn build_path(
		&self,
		nodes: &[Node],
		params: &Params,
		is_optional: bool,
		has_child: bool,
	) -> Result<String> {
		let mut path = String::new();
		let mut skippable = true;

		for node in nodes {
			match node {
				Node::Literal(text) => path.push_str(text),
				Node::Parameter { name, .. } => {
					let Some(value) = params.get(name) else {
						if !is_optional || has_child {
							return Err(RoutingError::MissingParameter {
								route: self.template.clone(),
								parameter: name.clone(),
							});
						}
						return Ok(String::new());
					};
					if !is_optional || has_child || self.defaults.get(name) != Some(value) {
						skippable = false;
					}
					let text = value_to_string(value)
						.ok_or_else(|| RoutingError::InvalidParameter(name.clone()))?;
					if let Some(constraint) = self.constraints.get(name)
						&& !constraint.is_match(&text)
					{
						return Err(RoutingError::InvalidParameter(name.clone()));
					}
					path.push_str(&encode(&text));
				}
				Node::Optional(children) => {
					let segment = self.build_path(children, params, true, has_child)?;
					if !segment.is_empty() {
						path.push_str(&segment);
						skippable = false;
					}
				}
			}
		}

		if is_optional && skippable {
			return Ok(String::new());
		}
		Ok(path)
	}
}

impl Route for Segment {
	fn match_path(&self, path: &str, offset: usize) -> Option<RouteMatch> {
		let rest = remainder(path, offset)?;
		let captures = self.regex.captures(rest)?;
		let whole = captures.get(0)?;

		let mut params = self.defaults.clone();
		for (group, name) in &self.groups {
			if let Some(value) = captures.name(group)
				&& !value.as_str().is_empty()
			{
				params.insert(name.clone(), Value::String(decode(value.as_str())));
			}
		}

		Some(RouteMatch::new(params, whole.end()))
	}

	fn assemble(&self, params: &Params, options: AssembleOptions<'_>) -> Result<String> {
		options.ensure_leaf()?;
		let mut merged = self.defaults.clone();
		merged.extend(params.iter().map(|(k, v)| (k.clone(), v.clone())));
		self.build_path(&self.nodes, &merged, false, options.has_child)
	}
}

fn parse(template: &str) -> Result<Vec<Node>> {
	let invalid = |message: &str| RoutingError::InvalidPattern {
		pattern: template.to_string(),
		message: message.to_string(),
	};

	let mut levels: Vec<Vec<Node>> = vec![Vec::new()];
	let mut literal = String::new();
	let mut chars = template.chars().peekable();

	fn flush(literal: &mut String, level: &mut Vec<Node>) {
		if !literal.is_empty() {
			level.push(Node::Literal(std::mem::take(literal)));
		}
	}

	while let Some(ch) = chars.next() {
		match ch {
			'\\' => match chars.next() {
				Some(escaped) => literal.push(escaped),
				None => return Err(invalid("dangling escape")),
			},
			':' => {
				let mut name = String::new();
				while let Some(&c) = chars.peek() {
					if c.is_ascii_alphanumeric() || c == '_' {
						name.push(c);
						chars.next();
					} else {
						break;
					}
				}
				if name.is_empty() {
					return Err(invalid("empty parameter name"));
				}
				let mut delimiters = None;
				if chars.peek() == Some(&'{') {
					chars.next();
					let mut set = String::new();
					loop {
						match chars.next() {
							Some('}') => break,
							Some(c) => set.push(c),
							None => return Err(invalid("unterminated delimiter set")),
						}
					}
					delimiters = Some(set);
				}
				let level = levels.last_mut().ok_or_else(|| invalid("unbalanced brackets"))?;
				flush(&mut literal, level);
				level.push(Node::Parameter { name, delimiters });
			}
			'[' => {
				let level = levels.last_mut().ok_or_else(|| invalid("unbalanced brackets"))?;
				flush(&mut literal, level);
				levels.push(Vec::new());
			}
			']' => {
				if levels.len() < 2 {
					return Err(invalid("found closing bracket without matching opening bracket"));
				}
				let mut finished = levels.pop().unwrap_or_default();
				flush(&mut literal, &mut finished);
				if let Some(parent) = levels.last_mut() {
					parent.push(Node::Optional(finished));
				}
			}
			other => literal.push(other),
		}
	}

	if levels.len() != 1 {
		return Err(invalid("found unbalanced brackets"));
	}
	let mut root = levels.pop().unwrap_or_default();
	flush(&mut literal, &mut root);
	Ok(root)
}

fn build_regex(
	nodes: &[Node],
	constraints: &HashMap<String, String>,
	groups: &mut Vec<(String, String)>,
) -> String {
	let mut out = String::new();
	for node in nodes {
		match node {
			Node::Literal(text) => out.push_str(&regex::escape(text)),
			Node::Parameter { name, delimiters } => {
				let pattern = match (constraints.get(name), delimiters) {
					(Some(constraint), _) => format!("(?:{constraint})"),
					(None, Some(set)) => {
						let escaped: String = set.chars().map(|c| regex::escape(&c.to_string())).collect();
						format!("[^{escaped}]+")
					}
					(None, None) => "[^/]+".to_string(),
				};
				let group = format!("p{}", groups.len());
				out.push_str(&format!("(?P<{group}>{pattern})"));
				groups.push((group, name.clone()));
			}
			Node::Optional(children) => {
				out.push_str("(?:");
				out.push_str(&build_regex(children, constraints, groups));
				out.push_str(")?");
			}
		}
	}
	out
}
