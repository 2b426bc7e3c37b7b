/// Hostname shown on bookmark cards. Falls back to the raw string when the
/// URL does not parse (the input control validates, the card must not panic).
pub(crate) fn host_of_url(url: &str) -> String {
    match web_sys::Url::new(url) {
        Ok(parsed) => {
            let host = parsed.host();
            if host.is_empty() {
                url.to_string()
            } else {
                host
            }
        }
        Err(_) => url.to_string(),
    }
}

/// Short human date for a backend `created_at` timestamp.
pub(crate) fn format_created_at(created_at: &str) -> String {
    if created_at.trim().is_empty() {
        return String::new();
    }

    let d = js_sys::Date::new(&created_at.into());
    if d.get_time().is_nan() {
        return created_at.to_string();
    }

    let opts = js_sys::Object::new();
    let _ = js_sys::Reflect::set(&opts, &"year".into(), &"numeric".into());
    let _ = js_sys::Reflect::set(&opts, &"month".into(), &"short".into());
    let _ = js_sys::Reflect::set(&opts, &"day".into(), &"numeric".into());

    d.to_locale_date_string("en-US", &opts).into()
}
