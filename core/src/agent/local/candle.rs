//! Causal language model generation with candle
//!
//! Downloads `config.json`, `tokenizer.json` and the safetensors weights of a
//! model repository from the Hugging Face Hub and keeps them resident. The
//! architecture is chosen from `model_type` in `config.json`.

use super::{GeneratedSequence, GenerationParams, TextGenerationPipeline};
use crate::config::LocalConfig;
use crate::{debug_log, warn_log};
use anyhow::{bail, Context, Result};
use candle_core::{DType, Device, Tensor};
use candle_nn::VarBuilder;
use candle_transformers::generation::LogitsProcessor;
use candle_transformers::models::{gemma, llama, mistral, phi3, qwen2};
use hf_hub::api::sync::{Api, ApiRepo};
use hf_hub::{Repo, RepoType};
use parking_lot::Mutex;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::collections::BTreeSet;
use std::path::PathBuf;
use tokenizers::Tokenizer;

/// Tokens that end generation when the model config names none
const FALLBACK_EOS_TOKENS: &[&str] = &["</s>", "<|endoftext|>", "<|eot_id|>", "<|end|>", "<eos>"];

/// Context length assumed when `config.json` omits `max_position_embeddings`
const DEFAULT_MAX_POSITIONS: usize = 4096;

/// Model families this pipeline can run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Architecture {
    Llama,
    Mistral,
    Qwen2,
    Phi3,
    Gemma,
}

impl Architecture {
    pub const SUPPORTED: &'static [&'static str] = &["llama", "mistral", "qwen2", "phi3", "gemma"];

    pub fn from_model_type(model_type: &str) -> Result<Self> {
        match model_type {
            "llama" => Ok(Self::Llama),
            "mistral" => Ok(Self::Mistral),
            "qwen2" => Ok(Self::Qwen2),
            "phi3" => Ok(Self::Phi3),
            "gemma" => Ok(Self::Gemma),
            other => bail!(
                "unsupported model_type `{}` (supported: {})",
                other,
                Self::SUPPORTED.join(", ")
            ),
        }
    }
}

impl std::fmt::Display for Architecture {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Llama => "llama",
            Self::Mistral => "mistral",
            Self::Qwen2 => "qwen2",
            Self::Phi3 => "phi3",
            Self::Gemma => "gemma",
        };
        f.write_str(name)
    }
}

/// Architecture-independent facts read from `config.json`
#[derive(Debug, Clone, PartialEq)]
pub struct ModelSpec {
    pub architecture: Architecture,
    pub max_positions: usize,
    pub eos_token_ids: Vec<u32>,
}

impl ModelSpec {
    pub fn from_config_json(config: &Value) -> Result<Self> {
        let model_type = config
            .get("model_type")
            .and_then(Value::as_str)
            .context("config.json has no model_type")?;
        let architecture = Architecture::from_model_type(model_type)?;

        let max_positions = config
            .get("max_position_embeddings")
            .and_then(Value::as_u64)
            .map(|n| n as usize)
            .unwrap_or(DEFAULT_MAX_POSITIONS);

        let eos_token_ids = match config.get("eos_token_id") {
            Some(Value::Number(id)) => id.as_u64().map(|id| vec![id as u32]).unwrap_or_default(),
            Some(Value::Array(ids)) => ids
                .iter()
                .filter_map(Value::as_u64)
                .map(|id| id as u32)
                .collect(),
            _ => Vec::new(),
        };

        Ok(Self {
            architecture,
            max_positions,
            eos_token_ids,
        })
    }

    /// The prompt must leave room for at least one new token
    fn check_prompt_fits(&self, prompt_len: usize) -> Result<()> {
        if prompt_len >= self.max_positions {
            bail!(
                "prompt is {} tokens but the model context holds {}",
                prompt_len,
                self.max_positions
            );
        }
        Ok(())
    }
}

/// A loaded model together with its key/value cache
enum CausalLm {
    Llama {
        model: llama::Llama,
        config: llama::Config,
        cache: llama::Cache,
    },
    Mistral(mistral::Model),
    Qwen2(qwen2::ModelForCausalLM),
    Phi3(phi3::Model),
    Gemma(gemma::Model),
}

fn parse_config<T: DeserializeOwned>(config: Value, architecture: Architecture) -> Result<T> {
    serde_json::from_value(config)
        .with_context(|| format!("config.json is not a valid {} config", architecture))
}

impl CausalLm {
    fn load(
        architecture: Architecture,
        config: Value,
        vb: VarBuilder,
        dtype: DType,
        device: &Device,
    ) -> Result<Self> {
        let model = match architecture {
            Architecture::Llama => {
                let config =
                    parse_config::<llama::LlamaConfig>(config, architecture)?.into_config(false);
                let cache = llama::Cache::new(true, dtype, &config, device)?;
                let model = llama::Llama::load(vb, &config)?;
                CausalLm::Llama {
                    model,
                    config,
                    cache,
                }
            }
            Architecture::Mistral => {
                let config = parse_config::<mistral::Config>(config, architecture)?;
                CausalLm::Mistral(mistral::Model::new(&config, vb)?)
            }
            Architecture::Qwen2 => {
                let config = parse_config::<qwen2::Config>(config, architecture)?;
                CausalLm::Qwen2(qwen2::ModelForCausalLM::new(&config, vb)?)
            }
            Architecture::Phi3 => {
                let config = parse_config::<phi3::Config>(config, architecture)?;
                CausalLm::Phi3(phi3::Model::new(&config, vb)?)
            }
            Architecture::Gemma => {
                let config = parse_config::<gemma::Config>(config, architecture)?;
                CausalLm::Gemma(gemma::Model::new(false, &config, vb)?)
            }
        };
        Ok(model)
    }

    fn clear_cache(&mut self, dtype: DType, device: &Device) -> Result<()> {
        match self {
            CausalLm::Llama { config, cache, .. } => {
                *cache = llama::Cache::new(true, dtype, config, device)?;
            }
            CausalLm::Mistral(model) => model.clear_kv_cache(),
            CausalLm::Qwen2(model) => model.clear_kv_cache(),
            CausalLm::Phi3(model) => model.clear_kv_cache(),
            CausalLm::Gemma(model) => model.clear_kv_cache(),
        }
        Ok(())
    }

    /// Logits for the token after `input`, as a flat f32 vector
    fn forward(&mut self, input: &Tensor, index_pos: usize) -> Result<Tensor> {
        let logits = match self {
            CausalLm::Llama { model, cache, .. } => model.forward(input, index_pos, cache)?,
            CausalLm::Mistral(model) => model.forward(input, index_pos)?,
            CausalLm::Qwen2(model) => model.forward(input, index_pos)?,
            CausalLm::Phi3(model) => model.forward(input, index_pos)?,
            CausalLm::Gemma(model) => model.forward(input, index_pos)?,
        };
        // [1, vocab] or [1, 1, vocab] for a batch of one
        Ok(logits.flatten_all()?.to_dtype(DType::F32)?)
    }
}

pub struct CandlePipeline {
    tokenizer: Tokenizer,
    model: Mutex<CausalLm>,
    spec: ModelSpec,
    device: Device,
    dtype: DType,
    seed: u64,
}

impl CandlePipeline {
    /// Resolve and load `model_id`; fails when the architecture is not
    /// supported or the repository, tokenizer or weights cannot be fetched
    /// or parsed.
    pub fn load(model_id: &str, config: &LocalConfig) -> Result<Self> {
        let device = if config.use_gpu {
            Device::cuda_if_available(0)?
        } else {
            Device::Cpu
        };
        let dtype = if config.quantize { DType::F16 } else { DType::F32 };

        let api = Api::new().context("Failed to initialise the Hugging Face Hub client")?;
        let repo = api.repo(Repo::with_revision(
            model_id.to_string(),
            RepoType::Model,
            config.revision.clone(),
        ));

        let config_path = repo
            .get("config.json")
            .with_context(|| format!("Failed to fetch config.json for {}", model_id))?;
        let model_config: Value = serde_json::from_slice(&std::fs::read(&config_path)?)
            .context("config.json is not valid JSON")?;
        let mut spec = ModelSpec::from_config_json(&model_config)?;

        let tokenizer_path = repo
            .get("tokenizer.json")
            .with_context(|| format!("Failed to fetch tokenizer.json for {}", model_id))?;
        let tokenizer = Tokenizer::from_file(&tokenizer_path).map_err(anyhow::Error::msg)?;

        if spec.eos_token_ids.is_empty() {
            spec.eos_token_ids = FALLBACK_EOS_TOKENS
                .iter()
                .filter_map(|token| tokenizer.token_to_id(token))
                .collect();
        }
        if spec.eos_token_ids.is_empty() {
            warn_log!(
                "{} names no end-of-sequence token; generation stops at max_new_tokens",
                model_id
            );
        }

        let weights = weight_files(&repo)?;
        debug_log!(
            "Loading {} {} weight file(s) for {} as {:?} on {:?}",
            weights.len(),
            spec.architecture,
            model_id,
            dtype,
            device
        );
        // Safety: the weight files are not modified while mapped.
        let vb = unsafe { VarBuilder::from_mmaped_safetensors(&weights, dtype, &device)? };
        let model = CausalLm::load(spec.architecture, model_config, vb, dtype, &device)
            .context("Failed to build model from weights")?;

        Ok(Self {
            tokenizer,
            model: Mutex::new(model),
            spec,
            device,
            dtype,
            seed: config.seed,
        })
    }

    pub fn architecture(&self) -> Architecture {
        self.spec.architecture
    }

    fn is_eos(&self, token: u32) -> bool {
        self.spec.eos_token_ids.contains(&token)
    }

    /// Sample up to `max_new_tokens` tokens after `prompt`
    fn continue_tokens(
        &self,
        model: &mut CausalLm,
        prompt: &[u32],
        params: &GenerationParams,
        seed: u64,
    ) -> Result<Vec<u32>> {
        model.clear_cache(self.dtype, &self.device)?;
        let temperature = (params.temperature > 0.0).then_some(params.temperature);
        let mut sampler = LogitsProcessor::new(seed, temperature, None);

        let mut tokens = prompt.to_vec();
        let mut generated = Vec::new();
        let mut index_pos = 0;

        for step in 0..params.max_new_tokens {
            if tokens.len() >= self.spec.max_positions {
                break;
            }
            let context = if step == 0 {
                &tokens[..]
            } else {
                &tokens[tokens.len() - 1..]
            };
            let input = Tensor::new(context, &self.device)?.unsqueeze(0)?;
            let logits = model.forward(&input, index_pos)?;
            index_pos += context.len();

            let next = sampler.sample(&logits)?;
            if self.is_eos(next) {
                break;
            }
            tokens.push(next);
            generated.push(next);
        }

        Ok(generated)
    }
}

impl TextGenerationPipeline for CandlePipeline {
    fn generate(&self, prompt: &str, params: &GenerationParams) -> Result<Vec<GeneratedSequence>> {
        let prompt_tokens = self
            .tokenizer
            .encode(prompt, true)
            .map_err(anyhow::Error::msg)?
            .get_ids()
            .to_vec();
        if prompt_tokens.is_empty() {
            bail!("prompt encodes to no tokens");
        }
        self.spec.check_prompt_fits(prompt_tokens.len())?;

        let mut model = self.model.lock();
        let mut sequences = Vec::with_capacity(params.num_return_sequences);
        for i in 0..params.num_return_sequences {
            let generated = self.continue_tokens(
                &mut model,
                &prompt_tokens,
                params,
                self.seed.wrapping_add(i as u64),
            )?;
            debug_log!(
                "Generated {} token(s) from a {}-token prompt",
                generated.len(),
                prompt_tokens.len()
            );

            let ids = if params.return_full_text {
                [prompt_tokens.as_slice(), generated.as_slice()].concat()
            } else {
                generated
            };
            let generated_text = self.tokenizer.decode(&ids, true).map_err(anyhow::Error::msg)?;
            sequences.push(GeneratedSequence { generated_text });
        }

        Ok(sequences)
    }
}

/// Local paths of every safetensors shard in the repository
fn weight_files(repo: &ApiRepo) -> Result<Vec<PathBuf>> {
    let index_path = match repo.get("model.safetensors.index.json") {
        Ok(path) => path,
        Err(_) => {
            let single = repo
                .get("model.safetensors")
                .context("Repository has neither model.safetensors nor a sharded index")?;
            return Ok(vec![single]);
        }
    };

    let index: Value = serde_json::from_slice(&std::fs::read(&index_path)?)?;
    let weight_map = index
        .get("weight_map")
        .and_then(|m| m.as_object())
        .context("model.safetensors.index.json has no weight_map")?;

    let shards: BTreeSet<&str> = weight_map.values().filter_map(|v| v.as_str()).collect();
    shards
        .into_iter()
        .map(|shard| {
            repo.get(shard)
                .with_context(|| format!("Failed to fetch weight shard {}", shard))
        })
        .collect()
}
