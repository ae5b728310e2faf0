//! Content-Security-Policy header for every response.
//!
//! Embed providers are reached only as iframe targets and are untrusted;
//! the `frame-src` allow-list restricts which origins may be embedded.

/// Build the CSP header value with the given `frame-src` allow-list.
pub fn csp_header(frame_origins: &[String]) -> String {
    let frames = frame_origins.join(" ");
    [
        "default-src 'self'".to_string(),
        "img-src 'self' https: data:".to_string(),
        "style-src 'self' 'unsafe-inline'".to_string(),
        "script-src 'self'".to_string(),
        format!("frame-src 'self' {frames}").trim_end().to_string(),
        "connect-src 'self' https://api.themoviedb.org https://image.tmdb.org".to_string(),
        "font-src 'self' data:".to_string(),
    ]
    .join("; ")
}
