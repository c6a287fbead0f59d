use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Immutable pipeline configuration, constructed once at startup and passed
/// into each stage constructor. Stages never read the environment directly.
#[derive(Clone)]
pub struct Config {
    pub semantic_scholar_key: Option<String>,
    pub crossref_mailto: Option<String>,
    pub factcheck_api_key: Option<String>,
    pub hf_api_token: Option<String>,
    /// HF-style summarization inference endpoint. `None` forces the
    /// heuristic summarizer regardless of `use_remote_summarizer`.
    pub summarizer_endpoint: Option<String>,
    pub use_remote_summarizer: bool,
    pub corpus_dir: PathBuf,
    pub lookup_timeout_secs: u64,
    pub factcheck_timeout_secs: u64,
    pub factcheck_max_retries: u32,
    /// Fixed delay between successive fact-check calls, and the backoff
    /// unit between retry attempts.
    pub factcheck_delay_ms: u64,
    pub max_claims: usize,
    pub max_citations: usize,
    /// Minimum trimmed length of extracted text; shorter documents are
    /// rejected before any stage runs.
    pub min_text_chars: usize,
    /// Materiality threshold for plagiarism matches, on the 0–1 scale.
    pub match_threshold: f64,
    pub disabled_lookups: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            semantic_scholar_key: None,
            crossref_mailto: None,
            factcheck_api_key: None,
            hf_api_token: None,
            summarizer_endpoint: None,
            use_remote_summarizer: true,
            corpus_dir: PathBuf::from("corpus"),
            lookup_timeout_secs: 10,
            factcheck_timeout_secs: 8,
            factcheck_max_retries: 3,
            factcheck_delay_ms: 500,
            max_claims: 20,
            max_citations: 50,
            min_text_chars: 100,
            match_threshold: 0.10,
            disabled_lookups: vec![],
        }
    }
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field(
                "semantic_scholar_key",
                &self.semantic_scholar_key.as_ref().map(|_| "***"),
            )
            .field("crossref_mailto", &self.crossref_mailto)
            .field(
                "factcheck_api_key",
                &self.factcheck_api_key.as_ref().map(|_| "***"),
            )
            .field("hf_api_token", &self.hf_api_token.as_ref().map(|_| "***"))
            .field("summarizer_endpoint", &self.summarizer_endpoint)
            .field("use_remote_summarizer", &self.use_remote_summarizer)
            .field("corpus_dir", &self.corpus_dir)
            .field("lookup_timeout_secs", &self.lookup_timeout_secs)
            .field("factcheck_timeout_secs", &self.factcheck_timeout_secs)
            .field("factcheck_max_retries", &self.factcheck_max_retries)
            .field("factcheck_delay_ms", &self.factcheck_delay_ms)
            .field("max_claims", &self.max_claims)
            .field("max_citations", &self.max_citations)
            .field("min_text_chars", &self.min_text_chars)
            .field("match_threshold", &self.match_threshold)
            .field("disabled_lookups", &self.disabled_lookups)
            .finish()
    }
}

impl Config {
    /// Build a config from the file cascade plus environment overrides.
    pub fn load() -> Self {
        let file = load_config_file();
        Self::from_file(file).with_env_overrides()
    }

    /// Apply a parsed config file over the defaults.
    pub fn from_file(file: ConfigFile) -> Self {
        let mut config = Config::default();

        if let Some(keys) = file.api_keys {
            config.semantic_scholar_key = keys.semantic_scholar_key;
            config.crossref_mailto = keys.crossref_mailto;
            config.factcheck_api_key = keys.factcheck_api_key;
            config.hf_api_token = keys.hf_api_token;
        }
        if let Some(s) = file.summarizer {
            if let Some(endpoint) = s.endpoint {
                config.summarizer_endpoint = Some(endpoint);
            }
            if let Some(mode) = s.mode {
                config.use_remote_summarizer = !mode.eq_ignore_ascii_case("heuristic");
            }
        }
        if let Some(p) = file.pipeline {
            if let Some(v) = p.lookup_timeout_secs {
                config.lookup_timeout_secs = v;
            }
            if let Some(v) = p.factcheck_timeout_secs {
                config.factcheck_timeout_secs = v;
            }
            if let Some(v) = p.factcheck_max_retries {
                config.factcheck_max_retries = v;
            }
            if let Some(v) = p.factcheck_delay_ms {
                config.factcheck_delay_ms = v;
            }
            if let Some(v) = p.max_claims {
                config.max_claims = v;
            }
            if let Some(v) = p.max_citations {
                config.max_citations = v;
            }
            if let Some(v) = p.match_threshold {
                config.match_threshold = v;
            }
            if let Some(v) = p.disabled_lookups {
                config.disabled_lookups = v;
            }
        }
        if let Some(c) = file.corpus {
            if let Some(dir) = c.dir {
                config.corpus_dir = PathBuf::from(dir);
            }
        }

        config
    }

    /// Environment variables win over file values.
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(v) = std::env::var("SEMANTIC_SCHOLAR_API_KEY") {
            self.semantic_scholar_key = Some(v);
        }
        if let Ok(v) = std::env::var("CROSSREF_MAILTO") {
            self.crossref_mailto = Some(v);
        }
        if let Ok(v) = std::env::var("FACTCHECK_API_KEY") {
            self.factcheck_api_key = Some(v);
        }
        if let Ok(v) = std::env::var("HF_API_TOKEN") {
            self.hf_api_token = Some(v);
        }
        if let Ok(v) = std::env::var("PAPERLENS_SUMMARIZER_ENDPOINT") {
            self.summarizer_endpoint = Some(v);
        }
        if let Ok(v) = std::env::var("PAPERLENS_SUMMARIZER") {
            self.use_remote_summarizer = !v.eq_ignore_ascii_case("heuristic");
        }
        if let Ok(v) = std::env::var("PAPERLENS_CORPUS_DIR") {
            self.corpus_dir = PathBuf::from(v);
        }
        self
    }
}

/// On-disk TOML configuration structure.
/// All fields are optional so partial configs work (merge with defaults).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConfigFile {
    pub api_keys: Option<ApiKeysSection>,
    pub summarizer: Option<SummarizerSection>,
    pub pipeline: Option<PipelineSection>,
    pub corpus: Option<CorpusSection>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ApiKeysSection {
    pub semantic_scholar_key: Option<String>,
    pub crossref_mailto: Option<String>,
    pub factcheck_api_key: Option<String>,
    pub hf_api_token: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SummarizerSection {
    /// "remote" or "heuristic".
    pub mode: Option<String>,
    pub endpoint: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PipelineSection {
    pub lookup_timeout_secs: Option<u64>,
    pub factcheck_timeout_secs: Option<u64>,
    pub factcheck_max_retries: Option<u32>,
    pub factcheck_delay_ms: Option<u64>,
    pub max_claims: Option<usize>,
    pub max_citations: Option<usize>,
    pub match_threshold: Option<f64>,
    pub disabled_lookups: Option<Vec<String>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CorpusSection {
    pub dir: Option<String>,
}

/// Platform config directory path: `<config_dir>/paperlens/config.toml`.
pub fn config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("paperlens").join("config.toml"))
}

/// Load config by cascading CWD `.paperlens.toml` over platform config.
/// CWD values override platform values.
pub fn load_config_file() -> ConfigFile {
    let platform = config_path().and_then(|p| load_from_path(&p));
    let cwd = load_from_path(&PathBuf::from(".paperlens.toml"));

    match (platform, cwd) {
        (None, None) => ConfigFile::default(),
        (Some(p), None) => p,
        (None, Some(c)) => c,
        (Some(p), Some(c)) => merge(p, c),
    }
}

/// Load a config from a specific path. Returns `None` if the file doesn't
/// exist or can't be parsed.
pub fn load_from_path(path: &PathBuf) -> Option<ConfigFile> {
    let content = std::fs::read_to_string(path).ok()?;
    toml::from_str(&content).ok()
}

/// Merge two configs: `overlay` section values take precedence over `base`.
pub fn merge(base: ConfigFile, overlay: ConfigFile) -> ConfigFile {
    ConfigFile {
        api_keys: Some(ApiKeysSection {
            semantic_scholar_key: pick(&overlay.api_keys, &base.api_keys, |a| {
                a.semantic_scholar_key.clone()
            }),
            crossref_mailto: pick(&overlay.api_keys, &base.api_keys, |a| {
                a.crossref_mailto.clone()
            }),
            factcheck_api_key: pick(&overlay.api_keys, &base.api_keys, |a| {
                a.factcheck_api_key.clone()
            }),
            hf_api_token: pick(&overlay.api_keys, &base.api_keys, |a| a.hf_api_token.clone()),
        }),
        summarizer: Some(SummarizerSection {
            mode: pick(&overlay.summarizer, &base.summarizer, |s| s.mode.clone()),
            endpoint: pick(&overlay.summarizer, &base.summarizer, |s| {
                s.endpoint.clone()
            }),
        }),
        pipeline: Some(PipelineSection {
            lookup_timeout_secs: pick(&overlay.pipeline, &base.pipeline, |p| {
                p.lookup_timeout_secs
            }),
            factcheck_timeout_secs: pick(&overlay.pipeline, &base.pipeline, |p| {
                p.factcheck_timeout_secs
            }),
            factcheck_max_retries: pick(&overlay.pipeline, &base.pipeline, |p| {
                p.factcheck_max_retries
            }),
            factcheck_delay_ms: pick(&overlay.pipeline, &base.pipeline, |p| p.factcheck_delay_ms),
            max_claims: pick(&overlay.pipeline, &base.pipeline, |p| p.max_claims),
            max_citations: pick(&overlay.pipeline, &base.pipeline, |p| p.max_citations),
            match_threshold: pick(&overlay.pipeline, &base.pipeline, |p| p.match_threshold),
            disabled_lookups: pick(&overlay.pipeline, &base.pipeline, |p| {
                p.disabled_lookups.clone()
            }),
        }),
        corpus: Some(CorpusSection {
            dir: pick(&overlay.corpus, &base.corpus, |c| c.dir.clone()),
        }),
    }
}

fn pick<S, T>(overlay: &Option<S>, base: &Option<S>, get: impl Fn(&S) -> Option<T>) -> Option<T> {
    overlay
        .as_ref()
        .and_then(&get)
        .or_else(|| base.as_ref().and_then(&get))
}
