// Licenced under the GNU General Public Licence, v3.  Please refer to the file "COPYING" for details.

#[allow(unused)]
use log::{Level, log_enabled, trace, debug, info, warn, error};
#[allow(unused)]
use crate::{ptrace, pdebug, pinfo, pwarn, perror};

use std::collections::HashMap;

use regex::Regex;

use super::script::{ScriptTextData, TextRef};

#[derive(Clone, PartialEq, Eq, Debug)]
enum Token {
	Text(String),
	Line(String),
	Cont(String),
	Para(String),
	Literal(String),
	Var(String),
}

impl Token {
	fn value(&self) -> &str {
		return match self {
			Token::Text(v) | Token::Line(v) | Token::Cont(v)
			| Token::Para(v) | Token::Literal(v) | Token::Var(v) => v,
		};
	}

	fn is_literal(&self) -> bool {
		return matches!(self, Token::Text(_) | Token::Line(_) | Token::Cont(_) | Token::Literal(_));
	}
}

/// Decodes a text source file into per-label display strings.
/// Labels end in `::`; the token commands under a label accumulate until
/// the next label flushes them.
pub fn extract_text(src : &str) -> HashMap<String, String> {
	lazy_static! {
		static ref LABEL : Regex = Regex::new(r"^(\S+)::").unwrap();
		static ref QUOTED : Regex = Regex::new(r#"^(text|line|cont|para)\s+"([^"]+)""#).unwrap();
		static ref TEXT_RAM : Regex = Regex::new(r"^text_ram\s+(\S+)").unwrap();
		static ref TEXT_DECIMAL : Regex = Regex::new(r"^text_decimal\s+(\S+),").unwrap();
		static ref NOOP : Regex = Regex::new(r"^(text_start|prompt|done)$").unwrap();
		static ref QUOTED_FRAGMENT : Regex = Regex::new(r#"^".*"$"#).unwrap();
	}
	let mut result = HashMap::new();
	let mut current_label : Option<String> = None;
	let mut tokens : Vec<Token> = Vec::new();

	for line in src.lines() {
		let line = line.trim();
		if line.is_empty() {
			continue;
		}
		if let Some(cap) = LABEL.captures(line) {
			if let Some(label) = current_label.take() {
				if !tokens.is_empty() {
					result.insert(label, join_tokens(&tokens));
				}
			}
			current_label = Some(cap[1].to_string());
			tokens.clear();
			continue;
		}
		if let Some(cap) = QUOTED.captures(line) {
			let value = cap[2].to_string();
			tokens.push(match &cap[1] {
				"text" => Token::Text(value),
				"line" => Token::Line(value),
				"cont" => Token::Cont(value),
				_ => Token::Para(value),
			});
			continue;
		}
		if let Some(cap) = TEXT_RAM.captures(line) {
			tokens.push(Token::Var(cap[1].to_string()));
			continue;
		}
		if let Some(cap) = TEXT_DECIMAL.captures(line) {
			tokens.push(Token::Var(cap[1].to_string()));
			continue;
		}
		if NOOP.is_match(line) {
			continue;
		}
		// last resort for lines carrying several fragments
		for part in line.split_whitespace() {
			if QUOTED_FRAGMENT.is_match(part) {
				tokens.push(Token::Literal(part[1..part.len() - 1].to_string()));
			}
		}
	}
	if let Some(label) = current_label {
		if !tokens.is_empty() {
			result.insert(label, join_tokens(&tokens));
		}
	}
	return result;
}

/// Tokens join with single spaces, except: `para` forces a line break; a
/// trailing `@` marks a substitution point before a variable token; and a
/// question or exclamation before `cont` breaks the line the way the game
/// dialogue box does.
fn join_tokens(tokens : &[Token]) -> String {
	let mut out = String::new();
	let mut prev : Option<&Token> = None;
	for t in tokens {
		if let Token::Para(v) = t {
			out.truncate(out.trim_end().len());
			out.push('\n');
			out.push_str(v);
			prev = Some(t);
			continue;
		}
		let token_text = match t {
			Token::Var(v) => format!("<var:{v}>"),
			_ => t.value().to_string(),
		};
		let mut joiner = " ";
		match prev {
			None => {
				joiner = "";
			},
			Some(p) => {
				if p.is_literal() && p.value().ends_with('@')
					&& matches!(t, Token::Var(_)) {
					if out.ends_with('@') {
						out.pop();
					}
				} else if matches!(p, Token::Line(_)) && matches!(t, Token::Cont(_))
					&& p.value().ends_with(|c| c == '?' || c == '!') {
					joiner = "\n";
				}
			},
		}
		out.push_str(joiner);
		out.push_str(&token_text);
		prev = Some(t);
	}
	return out.trim().to_string();
}

// ----------------------------------------
// Linking pointers to decoded text

#[derive(Clone, PartialEq, Eq, Debug)]
pub enum DialogueText {
	Trainer { before : String, end : String, after : String },
	Plain(Vec<String>),
}

pub type LinkedText = HashMap<String, DialogueText>;

/// Joins the pointer graph with the decoded text bodies.  A trainer entry
/// needs all three texts; a plain entry keeps whichever of its pointers
/// resolve.  Entries with nothing resolvable are dropped.
pub fn link_text(pointers : &ScriptTextData, texts : &HashMap<String, String>) -> LinkedText {
	let mut result = LinkedText::new();
	for (text_id, text_ref) in pointers {
		match text_ref {
			TextRef::Trainer { before, end, after } => {
				let resolved = (texts.get(before), texts.get(end), texts.get(after));
				if let (Some(b), Some(e), Some(a)) = resolved {
					result.insert(text_id.clone(), DialogueText::Trainer {
						before : b.clone(),
						end : e.clone(),
						after : a.clone(),
					});
				} else {
					pdebug!("dropping trainer text {text_id}: not all parts decoded");
				}
			},
			TextRef::Plain(labels) => {
				let resolved : Vec<String> = labels.iter()
					.filter_map(|l| texts.get(l).cloned())
					.collect();
				if !resolved.is_empty() {
					result.insert(text_id.clone(), DialogueText::Plain(resolved));
				}
			},
		}
	}
	return result;
}

// ----------------------------------------

#[test]
fn test_extract_basic_text() {
	let texts = extract_text(r#"
_OaksLabText1::
	text "I study POKéMON as"
	line "a profession."
	done
"#);
	assert_eq!(Some(&"I study POKéMON as a profession.".to_string()),
		   texts.get("_OaksLabText1"));
}

#[test]
fn test_extract_para_breaks_line() {
	let texts = extract_text(r#"
_SignText::
	text "TRAINER TIPS"
	para "Catch them all!"
"#);
	assert_eq!(Some(&"TRAINER TIPS\nCatch them all!".to_string()),
		   texts.get("_SignText"));
}

#[test]
fn test_extract_punctuated_line_cont() {
	let texts = extract_text(r#"
_GirlText::
	text "Hi!"
	line "Do you like maps?"
	cont "I sure do."
"#);
	assert_eq!(Some(&"Hi! Do you like maps?\nI sure do.".to_string()),
		   texts.get("_GirlText"));
}

#[test]
fn test_extract_variable_substitution() {
	let texts = extract_text(r#"
_RivalText::
	text "Yo@"
	text_ram wRivalName
	line "How goes it?"
"#);
	assert_eq!(Some(&"Yo <var:wRivalName> How goes it?".to_string()),
		   texts.get("_RivalText"));
	let texts = extract_text(r#"
_PriceText::
	text "That costs"
	text_decimal wItemPrice, 2, 4
	done
"#);
	assert_eq!(Some(&"That costs <var:wItemPrice>".to_string()),
		   texts.get("_PriceText"));
}

#[test]
fn test_extract_multiple_labels() {
	let texts = extract_text(r#"
_TextA::
	text "First."
_TextB::
	text "Second."
_Empty::
"#);
	assert_eq!(2, texts.len());
	assert_eq!(Some(&"First.".to_string()), texts.get("_TextA"));
	assert_eq!(Some(&"Second.".to_string()), texts.get("_TextB"));
}

#[cfg(test)]
fn test_pointers() -> ScriptTextData {
	let mut pointers = ScriptTextData::new();
	pointers.insert("TEXT_A".to_string(),
			TextRef::Plain(vec!["LabelX".to_string(), "LabelY".to_string()]));
	pointers.insert("TEXT_T".to_string(), TextRef::Trainer {
		before : "B".to_string(),
		end : "E".to_string(),
		after : "A".to_string(),
	});
	return pointers;
}

#[test]
fn test_link_plain_keeps_resolved_subset() {
	let mut texts = HashMap::new();
	texts.insert("LabelY".to_string(), "hello".to_string());
	let linked = link_text(&test_pointers(), &texts);
	assert_eq!(Some(&DialogueText::Plain(vec!["hello".to_string()])),
		   linked.get("TEXT_A"));
}

#[test]
fn test_link_drops_unresolvable() {
	// nothing resolves: no TEXT_A key at all
	let linked = link_text(&test_pointers(), &HashMap::new());
	assert!(!linked.contains_key("TEXT_A"));
	assert!(!linked.contains_key("TEXT_T"));
}

#[test]
fn test_link_trainer_needs_all_three() {
	let mut texts = HashMap::new();
	texts.insert("B".to_string(), "before".to_string());
	texts.insert("E".to_string(), "end".to_string());
	let linked = link_text(&test_pointers(), &texts);
	assert!(!linked.contains_key("TEXT_T"));
	texts.insert("A".to_string(), "after".to_string());
	let linked = link_text(&test_pointers(), &texts);
	assert_eq!(Some(&DialogueText::Trainer {
		before : "before".to_string(),
		end : "end".to_string(),
		after : "after".to_string(),
	}), linked.get("TEXT_T"));
}
