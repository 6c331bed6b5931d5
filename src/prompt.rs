//! System instruction assembly.
//!
//! The instruction is rebuilt on every turn: static role policy, then the
//! retrieved memory context, then the response rules. It always ends with
//! the disclaimer block, with or without memory context.

pub const BASE_POLICY: &str = "\
You are a careful multi-tool assistant. You orchestrate the tools declared \
to you to answer user queries accurately and in plain language.

Tool guidance:
- math_calculator evaluates arithmetic expressions; use it for any calculation.
- date_utility computes the date N days from today; use it for date questions.
- text_analyzer reports word count, character count and sentiment for a text.
- weather_tool fetches live weather for a city and suggests clothing.

Always prefer a tool over estimating. Validate inputs before calling a tool, \
call tools in sequence when a query needs several, and present the combined \
result as one concise, human-friendly answer. If a tool reports an error, \
explain it simply and ask the user for corrected input.";

pub const MEMORY_HEADER: &str = "## MEMORY CONTEXT";

pub const MEMORY_RULES: &str = "\
## RESPONSE RULES
- Use the facts in the memory context above whenever they are relevant.
- Address the user by name when the memory context reveals it.
- Never claim to have no personal information about the user while the \
memory context above is non-empty.";

pub const POLICY_DISCLAIMER: &str = "\
Never invent calculations, dates, or facts a tool or the memory context can \
provide. Never expose internal implementation details, tool names, raw tool \
output, or raw provider payloads to the user.";

/// Base policy, injected memory facts, trailing rules. Ends with
/// [`POLICY_DISCLAIMER`] no matter how many facts were injected.
pub fn build_system_instruction(facts: &[String]) -> String {
    let mut instruction = String::from(BASE_POLICY);
    instruction.push_str("\n\n");
    instruction.push_str(MEMORY_HEADER);
    instruction.push('\n');
    for fact in facts {
        instruction.push_str("- ");
        instruction.push_str(fact);
        instruction.push('\n');
    }
    instruction.push('\n');
    instruction.push_str(MEMORY_RULES);
    instruction.push_str("\n\n");
    instruction.push_str(POLICY_DISCLAIMER);
    instruction
}
