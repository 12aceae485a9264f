/// Formats a byte count the way reports and the summary display it:
/// plain bytes below 1 KiB, then two decimals in KB, MB or GB (1024-based).
pub fn format_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if bytes < KB {
        format!("{} bytes", bytes)
    } else if bytes < MB {
        format!("{:.2} KB", bytes as f64 / KB as f64)
    } else if bytes < GB {
        format!("{:.2} MB", bytes as f64 / MB as f64)
    } else {
        format!("{:.2} GB", bytes as f64 / GB as f64)
    }
}

pub fn format_human_elapsed(elapsed: std::time::Duration) -> String {
    let elapsed_secs = elapsed.as_secs();
    let elapsed_subsec_millis = elapsed.subsec_millis();
    if elapsed_secs >= 3600 {
        // h:mm:ss
        let hours = elapsed_secs / 3600;
        let minutes = (elapsed_secs % 3600) / 60;
        let seconds = elapsed_secs % 60;
        format!("{hours}:{minutes:02}:{seconds:02}.{elapsed_subsec_millis:03} (h:mm:ss.mmm)")
    } else if elapsed_secs >= 60 {
        let minutes = elapsed_secs / 60;
        let seconds = elapsed_secs % 60;
        format!("{minutes}:{seconds:02}.{elapsed_subsec_millis:03} (m:ss.mmm)")
    } else {
        format!("{}.{:03} seconds", elapsed_secs, elapsed_subsec_millis)
    }
}
