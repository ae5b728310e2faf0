//! Static embed-provider registry.
//!
//! Pure URL construction from a template table; whether a provider actually
//! has the title is only discovered at playback time by the fallback player.

use crate::StreamServer;

struct ProviderTemplate {
    name: &'static str,
    template: &'static str,
}

/// Providers are tried in listed order; the list position becomes the
/// server's priority.
const MOVIE_PROVIDERS: &[ProviderTemplate] = &[
    ProviderTemplate {
        name: "Vidnest",
        template: "https://vidnest.fun/movie/{id}",
    },
    ProviderTemplate {
        name: "Vidsrc",
        template: "https://vidsrc.net/embed/movie/{id}",
    },
];

const TV_PROVIDERS: &[ProviderTemplate] = &[
    ProviderTemplate {
        name: "Vidnest",
        template: "https://vidnest.fun/tv/{id}/{season}/{episode}",
    },
    ProviderTemplate {
        name: "Vidsrc",
        template: "https://vidsrc.net/embed/tv/{id}/{season}/{episode}",
    },
];

/// Ranked embed servers for a movie.
pub fn movie_servers(id: &str) -> Vec<StreamServer> {
    build_servers(MOVIE_PROVIDERS, &[("id", id)])
}

/// Ranked embed servers for one TV episode.
pub fn episode_servers(id: &str, season: &str, episode: &str) -> Vec<StreamServer> {
    build_servers(
        TV_PROVIDERS,
        &[("id", id), ("season", season), ("episode", episode)],
    )
}

/// Origins of every configured provider, for the CSP `frame-src` allow-list.
pub fn provider_origins() -> Vec<String> {
    let mut origins = Vec::new();
    for provider in MOVIE_PROVIDERS.iter().chain(TV_PROVIDERS) {
        if let Some(origin) = origin_of(provider.template) {
            if !origins.contains(&origin) {
                origins.push(origin);
            }
        }
    }
    origins
}

fn build_servers(providers: &[ProviderTemplate], vars: &[(&str, &str)]) -> Vec<StreamServer> {
    providers
        .iter()
        .enumerate()
        .map(|(index, provider)| {
            let mut url = provider.template.to_string();
            for (key, value) in vars {
                // Identifier components are percent-encoded before
                // interpolation to keep them a single path segment.
                url = url.replace(&format!("{{{key}}}"), &urlencoding::encode(value));
            }
            StreamServer {
                name: provider.name.to_string(),
                embed_url: url,
                priority: (index + 1) as u32,
            }
        })
        .collect()
}

fn origin_of(template: &str) -> Option<String> {
    let rest = template.strip_prefix("https://")?;
    let host = rest.split('/').next()?;
    Some(format!("https://{host}"))
}
