// src/config.rs
use std::time::Duration;


#[derive(Debug, Clone)]
pub struct ProviderConfig {
    pub api_key: Option<String>,
    pub base_url: String,
    pub model: String,
}

impl ProviderConfig {
    pub fn new(api_key: Option<String>, base_url: &str, model: &str) -> Self {
        Self {
            api_key: api_key.filter(|k| !is_placeholder_key(k)),
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct SupabaseConfig {
    pub url: String,
    pub key: String,
    pub bucket: String,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub http_timeout: Duration,
    pub openai: ProviderConfig,
    pub claude: ProviderConfig,
    pub perplexity: ProviderConfig,
    pub deepseek: ProviderConfig,
    pub supabase: Option<SupabaseConfig>,
    pub weather_api_key: Option<String>,
    pub weather_base_url: String,
    pub eu_pesticides_url: String,
    pub agris_search_url: String,
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a config from any key lookup. Missing or placeholder keys
    /// leave the corresponding integration unconfigured.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let env = EnvLookup(lookup);

        let supabase_url = env.first(&["SUPABASE_URL", "NEXT_PUBLIC_SUPABASE_URL"]);
        let supabase_key = env.first(&[
            "SUPABASE_SERVICE_ROLE_KEY",
            "SUPABASE_ANON_KEY",
            "NEXT_PUBLIC_SUPABASE_ANON_KEY",
        ])
        .filter(|k| !is_placeholder_key(k));
        let supabase = match (supabase_url, supabase_key) {
            (Some(url), Some(key)) if !is_placeholder_key(&url) => Some(SupabaseConfig {
                url: url.trim_end_matches('/').to_string(),
                key,
                bucket: env.or(&["SUPABASE_BUCKET"], "plant-images"),
            }),
            _ => None,
        };

        Self {
            host: env.or(&["HOST"], "0.0.0.0"),
            port: env.first(&["PORT"]).and_then(|p| p.parse().ok()).unwrap_or(8080),
            http_timeout: Duration::from_secs(
                env.first(&["HTTP_TIMEOUT_SECS"])
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(60),
            ),
            openai: ProviderConfig::new(
                env.first(&["OPENAI_API_KEY"]),
                &env.or(&["OPENAI_BASE_URL"], "https://api.openai.com/v1"),
                &env.or(&["OPENAI_MODEL"], "gpt-4o"),
            ),
            claude: ProviderConfig::new(
                env.first(&["ANTHROPIC_API_KEY", "CLAUDE_API_KEY"]),
                &env.or(&["ANTHROPIC_BASE_URL"], "https://api.anthropic.com/v1"),
                &env.or(&["ANTHROPIC_MODEL"], "claude-3-5-sonnet-20241022"),
            ),
            perplexity: ProviderConfig::new(
                env.first(&["PERPLEXITY_API_KEY"]),
                &env.or(&["PERPLEXITY_BASE_URL"], "https://api.perplexity.ai"),
                &env.or(&["PERPLEXITY_MODEL"], "sonar-pro"),
            ),
            deepseek: ProviderConfig::new(
                env.first(&["DEEPSEEK_API_KEY"]),
                &env.or(&["DEEPSEEK_BASE_URL"], "https://api.deepseek.com"),
                &env.or(&["DEEPSEEK_MODEL"], "deepseek-chat"),
            ),
            supabase,
            weather_api_key: env.first(&["OPENWEATHER_API_KEY", "OPENWEATHERMAP_API_KEY"])
                .filter(|k| !is_placeholder_key(k)),
            weather_base_url: env.or(
                &["OPENWEATHER_BASE_URL"],
                "https://api.openweathermap.org/data/3.0",
            ),
            eu_pesticides_url: env.or(
                &["EU_PESTICIDES_URL"],
                "https://ec.europa.eu/food/plant/pesticides/eu-pesticides-database/start/screen/active-substances",
            ),
            agris_search_url: env.or(&["AGRIS_SEARCH_URL"], "https://agris.fao.org/search/en"),
        }
    }
}

struct EnvLookup<F>(F);

impl<F> EnvLookup<F>
where
    F: Fn(&str) -> Option<String>,
{
    fn first(&self, keys: &[&str]) -> Option<String> {
        keys.iter()
            .filter_map(|k| (self.0)(k))
            .map(|v| v.trim().to_string())
            .find(|v| !v.is_empty())
    }

    fn or(&self, keys: &[&str], default: &str) -> String {
        self.first(keys).unwrap_or_else(|| default.to_string())
    }
}

/// Keys copied verbatim from `.env.example` templates are treated as absent.
pub fn is_placeholder_key(key: &str) -> bool {
    let key = key.trim().to_lowercase();
    key.is_empty()
        || key.starts_with("your")
        || key.contains("placeholder")
        || key.contains("changeme")
        || key.contains("xxxx")
        || key == "sk-..."
}
