//! Local-model agent
//!
//! The tokenizer and model are loaded once when the agent is built and kept
//! in memory for its whole lifetime. Each observation runs through a text
//! generation pipeline on a blocking worker thread.

#[cfg(feature = "local")]
pub mod candle;

#[cfg(feature = "local")]
pub use self::candle::CandlePipeline;

use super::{check_model_name, Agent};
use crate::config::LocalConfig;
use crate::error::{AgentError, Result};
use crate::debug_log;
use async_trait::async_trait;
use std::sync::Arc;

/// Options for one pipeline run
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationParams {
    /// Number of continuations to produce
    pub num_return_sequences: usize,
    /// Sampling temperature; 0 selects greedy decoding
    pub temperature: f64,
    /// Include the prompt at the start of each returned text
    pub return_full_text: bool,
    /// Upper bound on newly generated tokens
    pub max_new_tokens: usize,
}

impl GenerationParams {
    /// One continuation, prompt excluded
    pub fn single(temperature: f64, max_new_tokens: usize) -> Self {
        Self {
            num_return_sequences: 1,
            temperature,
            return_full_text: false,
            max_new_tokens,
        }
    }
}

/// One generated continuation
#[derive(Debug, Clone, PartialEq)]
pub struct GeneratedSequence {
    pub generated_text: String,
}

/// A tokenizer + model pair that turns a prompt into continuations
pub trait TextGenerationPipeline: Send + Sync + 'static {
    fn generate(
        &self,
        prompt: &str,
        params: &GenerationParams,
    ) -> anyhow::Result<Vec<GeneratedSequence>>;
}

/// Agent running a model inside this process
pub struct LocalAgent<P> {
    model_name: String,
    pipeline: Arc<P>,
    quantize: bool,
    params: GenerationParams,
}

#[cfg(feature = "local")]
impl LocalAgent<CandlePipeline> {
    /// Load `model_name` from the Hugging Face Hub.
    ///
    /// With `quantize` the weights are held in 16-bit precision.
    pub fn new(model_name: &str, quantize: bool) -> Result<Self> {
        let config = LocalConfig {
            quantize,
            ..Default::default()
        };
        Self::from_config(model_name, &config)
    }

    /// Load a model configured from a `[local]` section.
    ///
    /// Repositories whose `model_type` has no candle implementation here fail
    /// with [`AgentError::ModelLoad`] naming that type.
    pub fn from_config(model_name: &str, config: &LocalConfig) -> Result<Self> {
        let model_name = check_model_name(model_name)?;
        crate::info_log!(
            "Loading local model {} (revision={}, quantize={})",
            model_name,
            config.revision,
            config.quantize
        );

        let pipeline =
            CandlePipeline::load(&model_name, config).map_err(|e| AgentError::ModelLoad {
                model: model_name.clone(),
                message: format!("{:#}", e),
            })?;

        crate::info_log!("Local model {} loaded", model_name);
        Self::with_pipeline(&model_name, pipeline, config)
    }
}

impl<P: TextGenerationPipeline> LocalAgent<P> {
    /// Local agent around an already built pipeline
    pub fn with_pipeline(model_name: &str, pipeline: P, config: &LocalConfig) -> Result<Self> {
        Ok(Self {
            model_name: check_model_name(model_name)?,
            pipeline: Arc::new(pipeline),
            quantize: config.quantize,
            params: GenerationParams::single(config.temperature as f64, config.max_new_tokens),
        })
    }

    pub fn quantized(&self) -> bool {
        self.quantize
    }

    pub fn params(&self) -> &GenerationParams {
        &self.params
    }

    pub fn pipeline(&self) -> &P {
        &self.pipeline
    }
}

#[async_trait]
impl<P: TextGenerationPipeline> Agent for LocalAgent<P> {
    fn name(&self) -> &str {
        &self.model_name
    }

    async fn try_act(&self, observation: &str) -> Result<String> {
        let pipeline = Arc::clone(&self.pipeline);
        let params = self.params.clone();
        let prompt = observation.to_string();

        let sequences = tokio::task::spawn_blocking(move || pipeline.generate(&prompt, &params))
            .await
            .map_err(|e| AgentError::Generation {
                message: format!("generation worker stopped: {}", e),
            })?
            .map_err(|e| AgentError::Generation {
                message: format!("{:#}", e),
            })?;

        debug_log!("{} produced {} sequence(s)", self.model_name, sequences.len());

        sequences
            .into_iter()
            .next()
            .map(|seq| seq.generated_text.trim().to_string())
            .ok_or(AgentError::EmptyResponse)
    }
}
