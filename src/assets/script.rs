// Licenced under the GNU General Public Licence, v3.  Please refer to the file "COPYING" for details.

#[allow(unused)]
use log::{Level, log_enabled, trace, debug, info, warn, error};
#[allow(unused)]
use crate::{ptrace, pdebug, pinfo, pwarn, perror};

use std::collections::{HashMap, HashSet};

use regex::Regex;

/// Resolved text references for one TEXT_* id.
#[derive(Clone, PartialEq, Eq, Debug)]
pub enum TextRef {
	/// Trainer encounters carry three texts: challenge, defeat, post-fight.
	Trainer { before : String, end : String, after : String },
	/// All text labels reachable from the script block.
	Plain(Vec<String>),
}

pub type ScriptTextData = HashMap<String, TextRef>;

lazy_static! {
	static ref GLOBAL_DEF : Regex = Regex::new(r"^([A-Za-z0-9_]+):+$").unwrap();
	static ref DOT_DEF : Regex = Regex::new(r"^(\.[A-Za-z0-9_]+):{0,2}$").unwrap();
	static ref TOP_LEVEL : Regex = Regex::new(r"^[A-Za-z0-9_]+:").unwrap();
	static ref ANY_LABEL : Regex = Regex::new(r"^[A-Za-z0-9_.]+:").unwrap();
	static ref SECTION : Regex = Regex::new(r"^(\S+):").unwrap();
	static ref TEXT_POINTERS : Regex = Regex::new(r"(?i)_TextPointers\d*$").unwrap();
	static ref DW_CONST : Regex = Regex::new(r"dw_const\s+(\S+),\s+(\S+)").unwrap();
	static ref TRAINER : Regex = Regex::new(r"trainer\s+\S+,\s*\d+,\s*(\S+),\s*(\S+),\s*(\S+)").unwrap();
	static ref TEXT_FAR : Regex = Regex::new(r"(?i)^text_far\s+(\S+)").unwrap();
	static ref FARCALL : Regex = Regex::new(r"(?i)^(?:farcall|callfar)\s+(\S+)").unwrap();
	static ref COND_JUMP : Regex = Regex::new(r"(?i)^(?:jr|jp)\s+(?:nz|z|nc|c)\s*,\s*(\S+)").unwrap();
	static ref PLAIN_JP : Regex = Regex::new(r"(?i)^jp\s+(\S+)").unwrap();
	static ref LD_HL : Regex = Regex::new(r"(?i)^ld\s+hl,\s*(\S+)").unwrap();
	static ref RET : Regex = Regex::new(r"(?i)^ret\s*(.*)$").unwrap();
	static ref TRAINER_HEADER : Regex = Regex::new(r"(?i)ld\s+hl,\s*\S*TrainerHeader").unwrap();
}

/// Line span of a label's block, label line included.
type Span = (usize, usize);

/// Trimmed source lines plus an index of label definition lines, so block
/// lookups are by name instead of repeated text search.
struct Script<'a> {
	lines : Vec<&'a str>,
	labels : HashMap<String, usize>,
}

impl<'a> Script<'a> {
	fn new(src : &'a str) -> Script<'a> {
		let lines : Vec<&str> = src.lines().map(|l| l.trim()).collect();
		let mut labels = HashMap::new();
		for (i, line) in lines.iter().enumerate() {
			let name = if let Some(cap) = GLOBAL_DEF.captures(line) {
				cap.get(1).unwrap().as_str()
			} else if let Some(cap) = DOT_DEF.captures(line) {
				cap.get(1).unwrap().as_str()
			} else {
				continue;
			};
			// first definition wins
			labels.entry(name.to_lowercase()).or_insert(i);
		}
		return Script { lines, labels };
	}

	fn block(&self, label : &str) -> Option<Span> {
		let start = *self.labels.get(&label.to_lowercase())?;
		return Some((start, self.block_end(start)));
	}

	fn block_end(&self, start : usize) -> usize {
		for i in start + 1..self.lines.len() {
			if TOP_LEVEL.is_match(self.lines[i]) {
				return i;
			}
		}
		return self.lines.len();
	}

	/// Finds a local label's sub-block inside an enclosing block.
	fn local_block(&self, context : Span, label : &str) -> Option<Span> {
		for i in context.0..context.1 {
			let line = self.lines[i].trim_end_matches(':');
			if self.lines[i].len() - line.len() <= 2 && line.eq_ignore_ascii_case(label) {
				return Some((i, context.1));
			}
		}
		return None;
	}

	/// One level of indirection: the first `text_far` operand in the
	/// label's block.
	fn resolve_text_pointer(&self, label : &str) -> Option<String> {
		let start = self.lines.iter().position(|line| {
			let stripped = line.trim_end_matches(':');
			return stripped.len() < line.len() && stripped.eq_ignore_ascii_case(label);
		})?;
		for line in &self.lines[start + 1..] {
			if let Some(cap) = TEXT_FAR.captures(line) {
				return Some(cap[1].to_string());
			}
			if ANY_LABEL.is_match(line) {
				break;
			}
		}
		return None;
	}

	/// Depth-first walk over a block's control flow, collecting every
	/// `text_far` target.  The visited set is cloned per branch so a
	/// diamond (two paths to the same label) still reaches it, while
	/// direct cycles terminate.
	fn follow(&self, label : &str, visited : &HashSet<String>,
		  context : Option<Span>, out : &mut Vec<String>) {
		if visited.contains(label) {
			return;
		}
		let mut branch_visited = visited.clone();
		branch_visited.insert(label.to_string());

		let span = match context.or_else(|| self.block(label)) {
			Some(s) => s,
			None => { return; },
		};
		for i in span.0..span.1 {
			let line = self.lines[i];
			if let Some(cap) = TEXT_FAR.captures(line) {
				push_unique(out, &cap[1]);
			} else if let Some(cap) = FARCALL.captures(line) {
				self.follow(&cap[1], &branch_visited, None, out);
			} else if let Some(cap) = COND_JUMP.captures(line) {
				self.follow_jump(&cap[1], &branch_visited, context, out);
			} else if let Some(cap) = PLAIN_JP.captures(line) {
				let target = &cap[1];
				if target != "TextScriptEnd" {
					self.follow_jump(target, &branch_visited, context, out);
				}
				// unconditional jump never falls through
				break;
			} else if let Some(cap) = LD_HL.captures(line) {
				let target = &cap[1];
				if target.starts_with('.') {
					if let Some(local) = self.local_block(span, target) {
						self.follow(target, &branch_visited, Some(local), out);
					}
				} else {
					self.follow(target, &branch_visited, None, out);
				}
			}
			if let Some(cap) = RET.captures(line) {
				if cap[1].trim().is_empty() {
					break;
				}
			}
		}
	}

	/// Jump targets starting with `.` are local to the enclosing context
	/// block; without a context there is nothing to resolve them against,
	/// so they are skipped.
	fn follow_jump(&self, target : &str, visited : &HashSet<String>,
		       context : Option<Span>, out : &mut Vec<String>) {
		if target.starts_with('.') {
			match context {
				Some(ctx) => {
					if let Some(local) = self.local_block(ctx, target) {
						self.follow(target, visited, Some(local), out);
					}
				},
				None => {
					pdebug!("local jump target {target} outside any context, skipping");
				},
			}
		} else {
			self.follow(target, visited, None, out);
		}
	}
}

fn push_unique(out : &mut Vec<String>, value : &str) {
	if !out.iter().any(|v| v == value) {
		out.push(value.to_string());
	}
}

// ----------------------------------------

/// Extracts the TEXT_* id to text-label mapping from a map script source.
/// Pointer ids come from `dw_const` lines in `*_TextPointers` sections;
/// trainer ids are matched positionally against `trainer` macro order.
pub fn extract_script_text_pointers(src : &str) -> ScriptTextData {
	let script = Script::new(src);

	let mut pointer_defs : Vec<(String, String)> = Vec::new();
	let mut current_section : Option<String> = None;
	for line in &script.lines {
		if let Some(cap) = SECTION.captures(line) {
			current_section = Some(cap[1].to_string());
			continue;
		}
		let in_pointers = current_section.as_deref()
			.map(|s| TEXT_POINTERS.is_match(s)).unwrap_or(false);
		if in_pointers {
			if let Some(cap) = DW_CONST.captures(line) {
				pointer_defs.push((cap[1].to_string(), cap[2].to_string()));
			}
		}
	}

	let trainers : Vec<(String, String, String)> = TRAINER.captures_iter(src)
		.map(|cap| (cap[1].to_string(), cap[2].to_string(), cap[3].to_string()))
		.collect();

	let mut result = ScriptTextData::new();
	let mut trainer_index = 0;
	for (pointer_name, text_id) in pointer_defs {
		if !text_id.starts_with("TEXT_") {
			continue;
		}
		let block = script.block(&pointer_name);
		if is_trainer_block(&script, block) {
			if let Some((before, end, after)) = trainers.get(trainer_index) {
				trainer_index += 1;
				result.insert(text_id, TextRef::Trainer {
					before : script.resolve_text_pointer(before)
						.unwrap_or_else(|| before.clone()),
					end : script.resolve_text_pointer(end)
						.unwrap_or_else(|| end.clone()),
					after : script.resolve_text_pointer(after)
						.unwrap_or_else(|| after.clone()),
				});
			} else {
				pwarn!("more trainer scripts than trainer macros at {pointer_name}");
				result.insert(text_id, TextRef::Plain(vec![pointer_name]));
			}
		} else {
			let mut resolved = Vec::new();
			script.follow(&pointer_name, &HashSet::new(), block, &mut resolved);
			if resolved.is_empty() {
				resolved.push(pointer_name);
			}
			result.insert(text_id, TextRef::Plain(resolved));
		}
	}
	return result;
}

fn is_trainer_block(script : &Script, block : Option<Span>) -> bool {
	let (start, end) = match block {
		Some(s) => s,
		None => { return false; },
	};
	return script.lines[start..end].iter().any(|line| {
		let lower = line.to_lowercase();
		return lower.contains("talktotrainer") || TRAINER_HEADER.is_match(line);
	});
}

// ----------------------------------------

#[cfg(test)]
fn follow_from(src : &str, label : &str) -> Vec<String> {
	let script = Script::new(src);
	let block = script.block(label);
	let mut out = Vec::new();
	script.follow(label, &HashSet::new(), block, &mut out);
	out.sort();
	return out;
}

#[test]
fn test_simple_pointer() {
	let data = extract_script_text_pointers("
Route1_TextPointers:
	dw_const Route1Text1, TEXT_ROUTE1_COOLTRAINER_F
Route1Text1:
	text_far _Route1Text1
	text_end
");
	assert_eq!(Some(&TextRef::Plain(vec!["_Route1Text1".to_string()])),
		   data.get("TEXT_ROUTE1_COOLTRAINER_F"));
}

#[test]
fn test_non_text_ids_skipped() {
	let data = extract_script_text_pointers("
Museum_TextPointers:
	dw_const MuseumScript0, SCRIPT_MUSEUM_DEFAULT
	dw_const MuseumText1, TEXT_MUSEUM_CLERK
MuseumText1:
	text_far _MuseumClerkText
");
	assert_eq!(1, data.len());
	assert!(data.contains_key("TEXT_MUSEUM_CLERK"));
}

#[test]
fn test_follow_farcall_and_diamond() {
	// both branches reach SharedText; it must be collected once
	let src = "
EntryText:
	jr nz, BranchA
	farcall BranchB
	text_end
BranchA:
	jp SharedText
BranchB:
	jp SharedText
SharedText:
	text_far _SharedText
	text_end
";
	assert_eq!(vec!["_SharedText".to_string()], follow_from(src, "EntryText"));
}

#[test]
fn test_unconditional_jp_terminates_block() {
	let src = "
EntryText:
	jp ElseWhere
	text_far _Unreachable
ElseWhere:
	text_far _Reached
	text_end
";
	assert_eq!(vec!["_Reached".to_string()], follow_from(src, "EntryText"));
}

#[test]
fn test_text_script_end_is_noop() {
	let src = "
EntryText:
	text_far _OnlyText
	jp TextScriptEnd
";
	assert_eq!(vec!["_OnlyText".to_string()], follow_from(src, "EntryText"));
}

#[test]
fn test_ret_terminates_block() {
	let src = "
EntryText:
	text_far _BeforeRet
	ret
	text_far _AfterRet
";
	assert_eq!(vec!["_BeforeRet".to_string()], follow_from(src, "EntryText"));
	// conditional ret falls through
	let src = "
EntryText:
	text_far _BeforeRet
	ret z
	text_far _AfterRet
";
	assert_eq!(vec!["_AfterRet".to_string(), "_BeforeRet".to_string()],
		   follow_from(src, "EntryText"));
}

#[test]
fn test_local_label_via_ld_hl() {
	let src = "
EntryText:
	ld hl, .localText
	ret
.localText
	text_far _LocalText
";
	assert_eq!(vec!["_LocalText".to_string()], follow_from(src, "EntryText"));
}

#[test]
fn test_conditional_local_jump_uses_context() {
	let src = "
EntryText:
	jr nz, .skip
	text_far _Taken
	ret
.skip
	text_far _Skipped
";
	assert_eq!(vec!["_Skipped".to_string(), "_Taken".to_string()],
		   follow_from(src, "EntryText"));
}

#[test]
fn test_cycle_terminates() {
	let src = "
LoopText:
	text_far _LoopText
	jp LoopText
";
	assert_eq!(vec!["_LoopText".to_string()], follow_from(src, "LoopText"));
}

#[test]
fn test_unresolved_block_falls_back_to_pointer_name() {
	let data = extract_script_text_pointers("
Route2_TextPointers:
	dw_const Route2Text1, TEXT_ROUTE2_SIGN
");
	assert_eq!(Some(&TextRef::Plain(vec!["Route2Text1".to_string()])),
		   data.get("TEXT_ROUTE2_SIGN"));
}

#[test]
fn test_trainer_pointers_positional() {
	let data = extract_script_text_pointers("
Route1_TextPointers:
	dw_const Route1Trainer0, TEXT_ROUTE1_YOUNGSTER
	dw_const Route1Trainer1, TEXT_ROUTE1_LASS

Route1TrainerHeaders:
	trainer EVENT_BEAT_ROUTE_1_TRAINER_0, 2, Trainer0BeforeText, Trainer0EndText, Trainer0AfterText
	trainer EVENT_BEAT_ROUTE_1_TRAINER_1, 3, Trainer1BeforeText, Trainer1EndText, Trainer1AfterText

Route1Trainer0:
	ld hl, Route1TrainerHeader0
	jp TalkToTrainer
Route1Trainer1:
	ld hl, Route1TrainerHeader1
	jp TalkToTrainer

Trainer0BeforeText:
	text_far _Trainer0BeforeText
Trainer0EndText:
	text_far _Trainer0EndText
Trainer0AfterText:
	text_far _Trainer0AfterText
Trainer1BeforeText:
	text_far _Trainer1BeforeText
Trainer1EndText:
	text_far _Trainer1EndText
Trainer1AfterText:
	text_far _Trainer1AfterText
");
	assert_eq!(Some(&TextRef::Trainer {
		before : "_Trainer0BeforeText".to_string(),
		end : "_Trainer0EndText".to_string(),
		after : "_Trainer0AfterText".to_string(),
	}), data.get("TEXT_ROUTE1_YOUNGSTER"));
	assert_eq!(Some(&TextRef::Trainer {
		before : "_Trainer1BeforeText".to_string(),
		end : "_Trainer1EndText".to_string(),
		after : "_Trainer1AfterText".to_string(),
	}), data.get("TEXT_ROUTE1_LASS"));
}

#[test]
fn test_trainer_without_macro_falls_back() {
	let data = extract_script_text_pointers("
Route9_TextPointers:
	dw_const Route9Trainer0, TEXT_ROUTE9_HIKER
Route9Trainer0:
	jp TalkToTrainer
");
	assert_eq!(Some(&TextRef::Plain(vec!["Route9Trainer0".to_string()])),
		   data.get("TEXT_ROUTE9_HIKER"));
}

#[test]
fn test_trainer_argument_unresolved_keeps_name() {
	let data = extract_script_text_pointers("
Route5_TextPointers:
	dw_const Route5Trainer0, TEXT_ROUTE5_CAMPER
Route5TrainerHeaders:
	trainer EVENT_BEAT_ROUTE_5_TRAINER_0, 2, CamperBeforeText, CamperEndText, CamperAfterText
Route5Trainer0:
	jp TalkToTrainer
CamperBeforeText:
	text_far _CamperBeforeText
");
	assert_eq!(Some(&TextRef::Trainer {
		before : "_CamperBeforeText".to_string(),
		end : "CamperEndText".to_string(),
		after : "CamperAfterText".to_string(),
	}), data.get("TEXT_ROUTE5_CAMPER"));
}
