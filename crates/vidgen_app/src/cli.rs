use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use vidgen_core::{
    Category, DurationUnit, EnhanceOptions, GenerationRequest, Routing, Theme, Tradition,
    VisualStyle,
};

use crate::config::{AppConfig, Encoding};

#[derive(Parser)]
#[command(name = "vidgen")]
#[command(
    about = "Submit AI video generation jobs and follow them to completion",
    long_about = None
)]
pub struct Cli {
    /// Configuration file; `./vidgen.ron` is used when present
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Mirror log output to the terminal
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Submit a prompt and track the job until it finishes
    Generate(GenerateArgs),
    /// Fetch a job's status once
    Status {
        job_id: String,
    },
    /// Show the recorded API cost ledger
    Ledger {
        /// Remove all recorded sessions
        #[arg(long)]
        clear: bool,
    },
}

#[derive(Args)]
pub struct GenerateArgs {
    /// Prompt (or conversation topic with --enhance-topic)
    pub prompt: String,

    #[arg(long, default_value_t = 5)]
    pub duration: u32,

    /// Interpret --duration as minutes
    #[arg(long)]
    pub minutes: bool,

    #[arg(long, default_value = "high")]
    pub quality: String,

    #[arg(long, default_value = "realistic")]
    pub style: String,

    /// Output size as WIDTHxHEIGHT, e.g. 1280x720
    #[arg(long, value_parser = parse_size)]
    pub size: Option<(u32, u32)>,

    #[arg(long)]
    pub human_focus: bool,

    #[arg(long)]
    pub model_id: Option<String>,

    /// Route to the Hunyuan model instead of Replicate
    #[arg(long)]
    pub hunyuan: bool,

    /// Submit as a JSON POST instead of a query GET
    #[arg(long)]
    pub json: bool,

    /// Devotional enhancement: religious tradition
    #[arg(long)]
    pub tradition: Option<Tradition>,

    /// Devotional enhancement: category
    #[arg(long)]
    pub category: Option<Category>,

    /// Devotional enhancement: spiritual theme
    #[arg(long)]
    pub theme: Option<Theme>,

    /// Devotional enhancement: visual style
    #[arg(long)]
    pub visual_style: Option<VisualStyle>,

    /// Broaden the prompt as a conversation topic
    #[arg(long, conflicts_with_all = ["tradition", "category", "theme", "visual_style"])]
    pub enhance_topic: bool,

    /// API key for model-based prompt enhancement
    #[arg(long)]
    pub openai_key: Option<String>,

    /// Delay between status checks; must be at least 1
    #[arg(long, value_parser = clap::value_parser!(u64).range(1..))]
    pub interval_ms: Option<u64>,

    #[arg(long)]
    pub max_attempts: Option<u32>,

    #[arg(long)]
    pub max_wait_secs: Option<u64>,
}

impl GenerateArgs {
    /// Devotional enhancement options, when any were given.
    pub fn enhance_options(&self) -> Option<EnhanceOptions> {
        if self.tradition.is_none()
            && self.category.is_none()
            && self.theme.is_none()
            && self.visual_style.is_none()
        {
            return None;
        }
        let defaults = EnhanceOptions::default();
        Some(EnhanceOptions {
            tradition: self.tradition.unwrap_or(defaults.tradition),
            category: self.category.unwrap_or(defaults.category),
            theme: self.theme.unwrap_or(defaults.theme),
            style: self.visual_style.unwrap_or(defaults.style),
        })
    }

    pub fn build_request(&self, prompt: String) -> GenerationRequest {
        let unit = if self.minutes {
            DurationUnit::Minutes
        } else {
            DurationUnit::Seconds
        };
        let mut request = GenerationRequest::new(prompt)
            .with_duration(self.duration, unit)
            .with_quality(self.quality.clone())
            .with_style(self.style.clone())
            .with_human_focus(self.human_focus)
            .with_routing(Routing {
                force_replicate: !self.hunyuan,
                use_hunyuan: self.hunyuan,
            });
        if let Some((width, height)) = self.size {
            request = request.with_resolution(width, height);
        }
        if let Some(model_id) = &self.model_id {
            request = request.with_model_id(model_id.clone());
        }
        request
    }

    pub fn apply_overrides(&self, config: &mut AppConfig) {
        if self.json {
            config.backend.encoding = Encoding::Json;
        }
        if let Some(interval_ms) = self.interval_ms {
            config.polling.interval_ms = interval_ms;
        }
        if let Some(max_attempts) = self.max_attempts {
            config.polling.max_attempts = Some(max_attempts);
        }
        if let Some(max_wait_secs) = self.max_wait_secs {
            config.polling.max_wait_secs = Some(max_wait_secs);
        }
        if let Some(key) = &self.openai_key {
            config.enhance.openai_api_key = Some(key.clone());
        }
    }
}

fn parse_size(value: &str) -> Result<(u32, u32), String> {
    let (width, height) = value
        .split_once(['x', 'X'])
        .ok_or_else(|| format!("expected WIDTHxHEIGHT, got {value:?}"))?;
    let parse = |part: &str| {
        part.trim()
            .parse::<u32>()
            .ok()
            .filter(|pixels| *pixels > 0)
            .ok_or_else(|| format!("invalid dimension {part:?}"))
    };
    Ok((parse(width)?, parse(height)?))
}
