//! Drill coaching: argument generation, rebuttal scoring, and post-debate
//! analysis.
//!
//! All three calls go straight to the generative endpoint. The scored
//! calls constrain the model with a response schema so the reply decodes
//! into a typed report instead of free prose.

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::error::Result;
use crate::generative::GenerativeClient;
use crate::sparring::{Side, SparringTurn};

/// Scores and notes for a single practice rebuttal.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RebuttalFeedback {
    pub clarity: f64,
    pub relevance: f64,
    pub persuasiveness: f64,
    pub constructive_feedback: String,
    pub positive_feedback: String,
}

/// Whole-debate review produced after a sparring session.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DebateAnalysis {
    #[serde(default)]
    pub key_strengths: Vec<String>,
    #[serde(default)]
    pub areas_for_improvement: Vec<String>,
    #[serde(default)]
    pub best_argument: String,
    #[serde(default)]
    pub overall_feedback: String,
}

/// Produces a single debatable argument on `topic` for the user to rebut.
pub async fn generate_argument(client: &GenerativeClient, topic: &str) -> Result<String> {
    client.generate_text(&argument_prompt(topic)).await
}

/// Scores the user's rebuttal against the argument it answers.
pub async fn score_rebuttal(
    client: &GenerativeClient,
    argument: &str,
    rebuttal: &str,
) -> Result<RebuttalFeedback> {
    client
        .generate_json(&rebuttal_prompt(argument, rebuttal), rebuttal_schema())
        .await
}

/// Reviews a finished sparring exchange from the user's side of the house.
pub async fn analyze_debate(
    client: &GenerativeClient,
    motion: &str,
    user_side: Side,
    turns: &[SparringTurn],
) -> Result<DebateAnalysis> {
    client
        .generate_json(&analysis_prompt(motion, user_side, turns), analysis_schema())
        .await
}

fn argument_prompt(topic: &str) -> String {
    format!(
        "Generate a single, concise, and debatable argument for a debate on the topic of \
         \"{topic}\". The argument should be from a clear perspective (e.g., for or against) \
         and presented as a single paragraph."
    )
}

fn rebuttal_prompt(argument: &str, rebuttal: &str) -> String {
    format!(
        "As a debate coach, analyze the following user's rebuttal to an argument.\n \
         Argument Presented: \"{argument}\"\n \
         User's Rebuttal: \"{rebuttal}\"\n \
         Provide feedback in JSON format. The JSON must have keys: \"clarity\" (a score out of 10), \
         \"relevance\" (a score out of 10), \"persuasiveness\" (a score out of 10), \
         \"constructiveFeedback\" (a string with one key suggestion for improvement), and \
         \"positiveFeedback\" (a string highlighting what the user did well)."
    )
}

fn analysis_prompt(motion: &str, user_side: Side, turns: &[SparringTurn]) -> String {
    let transcript = serde_json::to_string(turns).unwrap_or_else(|_| "[]".to_string());
    format!(
        "You are a world-class debate coach. Analyze the following debate transcript on the \
         motion: \"{motion}\". The user was the {user_side}. Provide a detailed analysis in JSON \
         format. The JSON must have keys: \"keyStrengths\" (an array of 2-3 strings), \
         \"areasForImprovement\" (an array of 2-3 strings), \"bestArgument\" (a string \
         summarizing the user's strongest point), and \"overallFeedback\" (a concise paragraph).\
         \n\nTranscript:\n{transcript}"
    )
}

fn rebuttal_schema() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "clarity": { "type": "NUMBER" },
            "relevance": { "type": "NUMBER" },
            "persuasiveness": { "type": "NUMBER" },
            "constructiveFeedback": { "type": "STRING" },
            "positiveFeedback": { "type": "STRING" },
        },
        "required": [
            "clarity",
            "relevance",
            "persuasiveness",
            "constructiveFeedback",
            "positiveFeedback",
        ],
    })
}

fn analysis_schema() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "keyStrengths": { "type": "ARRAY", "items": { "type": "STRING" } },
            "areasForImprovement": { "type": "ARRAY", "items": { "type": "STRING" } },
            "bestArgument": { "type": "STRING" },
            "overallFeedback": { "type": "STRING" },
        },
        "required": [
            "keyStrengths",
            "areasForImprovement",
            "bestArgument",
            "overallFeedback",
        ],
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sparring::SparringSpeaker;

    #[test]
    fn test_argument_prompt_carries_topic() {
        let prompt = argument_prompt("school uniforms");
        assert!(prompt.contains("\"school uniforms\""));
        assert!(prompt.contains("single paragraph"));
    }

    #[test]
    fn test_rebuttal_prompt_names_schema_keys() {
        let prompt = rebuttal_prompt("Cars should be banned", "Public transit cannot absorb it");
        assert!(prompt.contains("Argument Presented: \"Cars should be banned\""));
        assert!(prompt.contains("User's Rebuttal: \"Public transit cannot absorb it\""));
        for key in [
            "\"clarity\"",
            "\"relevance\"",
            "\"persuasiveness\"",
            "\"constructiveFeedback\"",
            "\"positiveFeedback\"",
        ] {
            assert!(prompt.contains(key), "missing {key}");
        }
    }

    #[test]
    fn test_analysis_prompt_appends_transcript() {
        let turns = vec![SparringTurn {
            speaker: SparringSpeaker::User,
            text: "opening point".to_string(),
        }];
        let prompt = analysis_prompt("This House would ban homework", Side::Government, &turns);
        assert!(prompt.contains("The user was the Government"));
        assert!(prompt.ends_with(&format!(
            "\n\nTranscript:\n{}",
            serde_json::to_string(&turns).unwrap()
        )));
    }

    #[test]
    fn test_rebuttal_schema_lists_all_keys() {
        let schema = rebuttal_schema();
        let required = schema["required"].as_array().unwrap();
        assert_eq!(required.len(), 5);
        assert_eq!(schema["properties"]["clarity"]["type"], "NUMBER");
        assert_eq!(schema["properties"]["positiveFeedback"]["type"], "STRING");
    }

    #[test]
    fn test_feedback_decodes_from_wire_names() {
        let feedback: RebuttalFeedback = serde_json::from_str(
            r#"{
                "clarity": 7,
                "relevance": 8.5,
                "persuasiveness": 6,
                "constructiveFeedback": "Attack the premise directly.",
                "positiveFeedback": "Strong structure."
            }"#,
        )
        .unwrap();
        assert_eq!(feedback.clarity, 7.0);
        assert_eq!(feedback.relevance, 8.5);
        assert_eq!(feedback.constructive_feedback, "Attack the premise directly.");
    }

    #[test]
    fn test_analysis_tolerates_missing_fields() {
        let analysis: DebateAnalysis =
            serde_json::from_str(r#"{ "bestArgument": "the cost point" }"#).unwrap();
        assert!(analysis.key_strengths.is_empty());
        assert_eq!(analysis.best_argument, "the cost point");
        assert!(analysis.overall_feedback.is_empty());
    }
}
