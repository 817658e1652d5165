use crate::analyst::AnalysisRecord;
use crate::error::PipelineError;
use crate::inference::{Inference, Message};
use crate::parse::truncate_chars;
use crate::pipeline::StageAgent;
use std::sync::Arc;

pub const AGENT_NAME: &str = "Critic Agent";

#[derive(Debug, Clone)]
pub struct CritiqueRecord {
    pub agent: String,
    pub topic: String,
    pub critique: String,
}

pub struct CriticAgent<C> {
    client: Arc<C>,
    /// Character window applied to the research text before embedding it;
    /// the analysis goes in whole.
    research_window: usize,
}

impl<C: Inference> CriticAgent<C> {
    pub fn new(client: Arc<C>, research_window: usize) -> Self {
        CriticAgent {
            client,
            research_window,
        }
    }
}

impl<C: Inference> StageAgent for CriticAgent<C> {
    type Input = AnalysisRecord;
    type Output = CritiqueRecord;

    async fn run(&self, input: AnalysisRecord) -> Result<CritiqueRecord, PipelineError> {
        let research_excerpt = truncate_chars(&input.original_research, self.research_window);

        let prompt = format!(
            "You are a critical thinking expert. Review the following analysis on \"{topic}\":\n\n\
             ORIGINAL RESEARCH:\n\
             {research_excerpt}...\n\n\
             ANALYSIS:\n\
             {analysis}\n\n\
             Provide a critical review:\n\n\
             1. **Logical Consistency**: Are there any logical flaws or contradictions?\n\
             2. **Bias Detection**: Are there any apparent biases or one-sided views?\n\
             3. **Evidence Quality**: Is the reasoning well-supported?\n\
             4. **Alternative Perspectives**: What alternative viewpoints are missing?\n\
             5. **Assumptions**: What assumptions are being made?\n\
             6. **Overall Assessment**: Rate the quality and provide constructive feedback\n\n\
             Be constructively critical and help improve the analysis.",
            topic = input.topic,
            analysis = input.analysis,
        );

        let messages = vec![
            Message::system(
                "You are an expert critical thinking agent specializing in logical analysis and bias detection.",
            ),
            Message::user(prompt),
        ];

        let critique = self.client.generate(messages, 0.5, 2048, false).await?;

        Ok(CritiqueRecord {
            agent: AGENT_NAME.to_string(),
            topic: input.topic,
            critique,
        })
    }
}
