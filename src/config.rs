use crate::common::constants::{
    DEFAULT_CPU_COUNT, DEFAULT_DISK_WORDS, DEFAULT_INITIAL_LOAD_PAGES, DEFAULT_MAX_JOB_WORDS,
    DEFAULT_PAGE_SIZE, DEFAULT_RAM_WORDS, REGISTER_COUNT,
};
use crate::common::SimError;
use crate::kernel::SchedulingPolicy;
use serde::Deserialize;
use std::path::Path;

const DEFAULT_LOG_LEVEL: &str = "info";
const DEFAULT_OUTPUT_DIR: &str = "output";
const DEFAULT_POLICY: &str = "SJF";

#[derive(Debug, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub cpu: CpuConfig,
    #[serde(default)]
    pub scheduling: SchedulingConfig,
    #[serde(default)]
    pub memory: MemoryConfig,
}

impl Config {
    /// Parses a configuration from TOML text.
    pub fn from_toml(text: &str) -> Result<Self, SimError> {
        toml::from_str(text).map_err(|e| SimError::Config(e.to_string()))
    }

    /// Reads and parses a TOML configuration file.
    pub fn load(path: &Path) -> Result<Self, SimError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml(&text)
    }

    /// Rejects geometries the simulator cannot run with.
    pub fn validate(&self) -> Result<(), SimError> {
        let fail = |msg: String| Err(SimError::Config(msg));
        if self.cpu.count == 0 {
            return fail("cpu.count must be at least 1".into());
        }
        if self.cpu.register_count == 0 || self.cpu.register_count > REGISTER_COUNT {
            return fail(format!(
                "cpu.register_count must be between 1 and {}",
                REGISTER_COUNT
            ));
        }
        if self.memory.page_size == 0 {
            return fail("memory.page_size must be at least 1".into());
        }
        if self.memory.frame_count() == 0 {
            return fail(format!(
                "memory.ram_words ({}) is smaller than one page",
                self.memory.ram_words
            ));
        }
        if self.memory.cache_slots() == 0 {
            return fail(format!(
                "memory.max_job_words ({}) is smaller than one page",
                self.memory.max_job_words
            ));
        }
        self.scheduling.policy_val()?;
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
pub struct GeneralConfig {
    #[serde(default)]
    pub trace_instructions: bool,
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default = "default_output_dir")]
    pub output_dir: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            trace_instructions: false,
            log_level: default_log_level(),
            output_dir: default_output_dir(),
        }
    }
}

impl GeneralConfig {
    /// Log level to install, `trace` when instruction tracing is on.
    pub fn log_level_val(&self) -> log::LevelFilter {
        if self.trace_instructions {
            return log::LevelFilter::Trace;
        }
        self.log_level.parse().unwrap_or(log::LevelFilter::Info)
    }
}

#[derive(Debug, Deserialize)]
pub struct CpuConfig {
    #[serde(default = "default_cpu_count")]
    pub count: usize,
    #[serde(default = "default_register_count")]
    pub register_count: usize,
}

impl Default for CpuConfig {
    fn default() -> Self {
        Self {
            count: default_cpu_count(),
            register_count: default_register_count(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct SchedulingConfig {
    #[serde(default = "default_policy")]
    pub policy: String,
}

impl Default for SchedulingConfig {
    fn default() -> Self {
        Self {
            policy: default_policy(),
        }
    }
}

impl SchedulingConfig {
    pub fn policy_val(&self) -> Result<SchedulingPolicy, SimError> {
        self.policy.parse()
    }
}

#[derive(Debug, Deserialize)]
pub struct MemoryConfig {
    #[serde(default = "default_page_size")]
    pub page_size: usize,
    #[serde(default = "default_ram_words")]
    pub ram_words: usize,
    #[serde(default = "default_disk_words")]
    pub disk_words: usize,
    #[serde(default = "default_max_job_words")]
    pub max_job_words: usize,
    #[serde(default = "default_initial_load_pages")]
    pub initial_load_pages: usize,
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            page_size: default_page_size(),
            ram_words: default_ram_words(),
            disk_words: default_disk_words(),
            max_job_words: default_max_job_words(),
            initial_load_pages: default_initial_load_pages(),
        }
    }
}

impl MemoryConfig {
    pub fn frame_count(&self) -> usize {
        self.ram_words / self.page_size.max(1)
    }

    pub fn disk_pages(&self) -> usize {
        self.disk_words / self.page_size.max(1)
    }

    /// Cache slots per process: one per page of the largest job, counting
    /// a partly filled last page.
    pub fn cache_slots(&self) -> usize {
        self.max_job_words.div_ceil(self.page_size.max(1))
    }
}

fn default_log_level() -> String {
    DEFAULT_LOG_LEVEL.to_string()
}

fn default_output_dir() -> String {
    DEFAULT_OUTPUT_DIR.to_string()
}

fn default_cpu_count() -> usize {
    DEFAULT_CPU_COUNT
}

fn default_register_count() -> usize {
    REGISTER_COUNT
}

fn default_policy() -> String {
    DEFAULT_POLICY.to_string()
}

fn default_page_size() -> usize {
    DEFAULT_PAGE_SIZE
}

fn default_ram_words() -> usize {
    DEFAULT_RAM_WORDS
}

fn default_disk_words() -> usize {
    DEFAULT_DISK_WORDS
}

fn default_max_job_words() -> usize {
    DEFAULT_MAX_JOB_WORDS
}

fn default_initial_load_pages() -> usize {
    DEFAULT_INITIAL_LOAD_PAGES
}
