//! Financial-analyst prompt for grounded question answering

use crate::providers::vector_store::VectorSearchResult;

/// QA prompt with `{context}` and `{question}` placeholders.
///
/// Several lines end in two spaces (markdown hard breaks); keep them.
pub const QA_PROMPT_TEMPLATE: &str = concat!(
    "\n",
    "You are a highly skilled financial analyst. \n",
    "Answer the question strictly using ONLY the information from the provided context. \n",
    "Do not use outside knowledge.\n",
    "\n",
    "When answering:\n",
    "- If the question is **numeric or factual** \u{2192} Give the exact number with units.  \n",
    "- If the question is **comparative** \u{2192} Show side-by-side values and state which is higher/lower.  \n",
    "- If the question is **analytical (\"why\" or \"how\")** \u{2192} Extract and explain reasons from context.  \n",
    "- If the question is **summary/overview** \u{2192} Highlight revenue, profit, margins, and growth.  \n",
    "\n",
    "Always structure your answer as follows:\n",
    "**Answer:** <clear, direct response>  \n",
    "**Supporting Context:** <quote or summarize the part of the context that justifies your answer>  \n",
    "\n",
    "If the answer is not available in the context, respond with:  \n",
    "\"The context does not provide this information.\"\n",
    "\n",
    "Context:\n",
    "{context}\n",
    "\n",
    "Question:\n",
    "{question}\n",
);

/// Prompt builder for QA queries
pub struct PromptBuilder;

impl PromptBuilder {
    /// Join retrieved chunk texts with blank lines, in retrieval order
    pub fn format_docs(results: &[VectorSearchResult]) -> String {
        results
            .iter()
            .map(|r| r.chunk.content.as_str())
            .collect::<Vec<_>>()
            .join("\n\n")
    }

    /// Render the QA prompt
    pub fn build(question: &str, context: &str) -> String {
        fill(QA_PROMPT_TEMPLATE, &[("context", context), ("question", question)])
    }
}

/// Substitute `{name}` placeholders in one pass, so braces inside the
/// substituted values are never expanded. Unknown placeholders are left as-is.
fn fill(template: &str, vars: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len() + vars.iter().map(|(_, v)| v.len()).sum::<usize>());
    let mut rest = template;

    while let Some(start) = rest.find('{') {
        out.push_str(&rest[..start]);
        let after = &rest[start + 1..];

        let value = after.find('}').and_then(|end| {
            let name = &after[..end];
            vars.iter()
                .find(|(key, _)| *key == name)
                .map(|(_, value)| (*value, end))
        });

        match value {
            Some((value, end)) => {
                out.push_str(value);
                rest = &after[end + 1..];
            }
            None => {
                out.push('{');
                rest = after;
            }
        }
    }

    out.push_str(rest);
    out
}
