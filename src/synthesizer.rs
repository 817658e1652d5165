use crate::analyst::AnalysisRecord;
use crate::critic::CritiqueRecord;
use crate::error::PipelineError;
use crate::inference::{Inference, Message};
use crate::parse::truncate_chars;
use crate::pipeline::StageAgent;
use crate::researcher::ResearchRecord;
use std::sync::Arc;
use std::time::{Duration, Instant};

pub const AGENT_NAME: &str = "Synthesizer Agent";

#[derive(Debug, Clone)]
pub struct SynthesisInput {
    pub research: ResearchRecord,
    pub analysis: AnalysisRecord,
    pub critique: CritiqueRecord,
}

#[derive(Debug, Clone)]
pub struct SynthesisRecord {
    pub agent: String,
    pub topic: String,
    pub final_report: String,
    pub synthesis_time: Duration,
    /// Local wall-clock time the report was generated, `%Y-%m-%d %H:%M:%S`.
    pub timestamp: String,
}

pub struct SynthesizerAgent<C> {
    client: Arc<C>,
    /// Character window applied to each of the three upstream texts.
    window: usize,
}

impl<C: Inference> SynthesizerAgent<C> {
    pub fn new(client: Arc<C>, window: usize) -> Self {
        SynthesizerAgent { client, window }
    }
}

impl<C: Inference> StageAgent for SynthesizerAgent<C> {
    type Input = SynthesisInput;
    type Output = SynthesisRecord;

    async fn run(&self, input: SynthesisInput) -> Result<SynthesisRecord, PipelineError> {
        let topic = input.research.topic.clone();
        let research = truncate_chars(&input.research.research, self.window);
        let analysis = truncate_chars(&input.analysis.analysis, self.window);
        let critique = truncate_chars(&input.critique.critique, self.window);

        let prompt = format!(
            "You are a master synthesizer. Create a comprehensive, well-structured report on \"{topic}\" by synthesizing the following inputs:\n\n\
             RESEARCH FINDINGS:\n\
             {research}\n\n\
             ANALYTICAL INSIGHTS:\n\
             {analysis}\n\n\
             CRITICAL REVIEW:\n\
             {critique}\n\n\
             Create a FINAL COMPREHENSIVE REPORT with:\n\n\
             # {topic}: Intelligence Report\n\n\
             ## Executive Summary\n\
             [Brief overview of key findings]\n\n\
             ## Core Findings\n\
             [Synthesized research insights]\n\n\
             ## Strategic Insights\n\
             [Analysis highlights and implications]\n\n\
             ## Critical Considerations\n\
             [Important critiques and alternative perspectives]\n\n\
             ## Recommendations\n\
             [Actionable recommendations]\n\n\
             ## Conclusion\n\
             [Final synthesis and outlook]\n\n\
             Make it cohesive, well-organized, and actionable."
        );

        let messages = vec![
            Message::system(
                "You are an expert synthesis agent that creates comprehensive, executive-level reports.",
            ),
            Message::user(prompt),
        ];

        let started = Instant::now();
        let final_report = self.client.generate(messages, 0.6, 3000, false).await?;
        let synthesis_time = started.elapsed();

        Ok(SynthesisRecord {
            agent: AGENT_NAME.to_string(),
            topic,
            final_report,
            synthesis_time,
            timestamp: chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string(),
        })
    }
}
