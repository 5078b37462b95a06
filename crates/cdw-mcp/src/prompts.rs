//! Guided-workflow prompts served through `prompts/list` and `prompts/get`.

use crate::protocol::{GetPromptResult, PromptDefinition, PromptMessage, ToolContent};

struct Prompt {
    name: &'static str,
    description: &'static str,
    text: &'static str,
}

const PROMPTS: &[Prompt] = &[
    Prompt {
        name: "clinical_data_exploration",
        description: "Guided workflow for exploring the warehouse schema and running queries",
        text: "I want to explore clinical data in the CDW. Please help me:\n\
               1. First, show me the database overview to understand available tables\n\
               2. Search the schema for tables related to my topic of interest\n\
               3. Describe the relevant tables to understand their columns\n\
               4. Write and execute queries to retrieve the data I need\n\n\
               Start by showing me the database overview.",
    },
    Prompt {
        name: "cohort_building",
        description: "Step-by-step cohort identification workflow",
        text: "I need to build a patient cohort for research. Please help me:\n\
               1. Identify the relevant diagnosis, procedure, or medication tables\n\
               2. Define inclusion and exclusion criteria using available columns\n\
               3. Count the cohort with a cohort summary\n\
               4. Extract demographics and clinical characteristics by PatientDurableKey\n\
               5. Export the cohort data to CSV for further analysis\n\n\
               What condition or criteria should we use to define the cohort?",
    },
    Prompt {
        name: "notes_analysis",
        description: "Guided clinical notes investigation",
        text: "I want to investigate clinical notes in the CDW. Please help me:\n\
               1. Search a patient's notes for specific keywords or concepts\n\
               2. Review note metadata (type, date, department)\n\
               3. Read full note text for relevant findings\n\
               4. Summarize patterns across multiple notes\n\n\
               What patient or keyword should we start searching for?",
    },
];

/// Every prompt, in a stable order.
pub fn list() -> Vec<PromptDefinition> {
    PROMPTS
        .iter()
        .map(|p| PromptDefinition {
            name: p.name.to_string(),
            description: Some(p.description.to_string()),
            arguments: Vec::new(),
        })
        .collect()
}

/// The prompt's single user message, or `None` for an unknown name.
pub fn get(name: &str) -> Option<GetPromptResult> {
    let prompt = PROMPTS.iter().find(|p| p.name == name)?;
    Some(GetPromptResult {
        description: Some(prompt.description.to_string()),
        messages: vec![PromptMessage {
            role: "user".to_string(),
            content: ToolContent::text(prompt.text),
        }],
    })
}
