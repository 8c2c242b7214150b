//! Human-readable output formatting

use crate::lifecycle::Snapshot;

fn yes_no(value: bool) -> &'static str {
    if value {
        "yes"
    } else {
        "no"
    }
}

pub fn format_human(snapshot: &Snapshot) -> String {
    let mut output = String::from("Containers\n----------\n");
    if snapshot.containers.is_empty() {
        output.push_str("  (none)\n");
    }
    for container in &snapshot.containers {
        output.push_str(&format!(
            "  {} ({}) - color: {}, icon: {}, clean: {}, deletes history: {}, tabs: {}",
            container.name,
            container.identity,
            container.color,
            container.icon,
            yes_no(container.clean),
            yes_no(container.deletes_history),
            container.tabs
        ));
        if container.history_entries > 0 {
            output.push_str(&format!(", history: {}", container.history_entries));
        }
        if container.cookie_count > 0 {
            output.push_str(&format!(", cookies: {}", container.cookie_count));
        }
        output.push('\n');
    }

    let stats = &snapshot.statistics;
    output.push_str(&format!(
        "\nStatistics\n----------\n\
         Containers deleted: {}\n\
         Cookies deleted:    {}\n\
         History-erasing:    {} containers, {} cookies, {} URLs\n",
        stats.containers_deleted,
        stats.cookies_deleted,
        stats.deletes_history.containers_deleted,
        stats.deletes_history.cookies_deleted,
        stats.deletes_history.urls_deleted
    ));

    if snapshot.removal_in_progress {
        output.push_str("\nRemoval in progress\n");
    }
    if let Some(run) = &snapshot.last_run {
        output.push_str(&format!("\nLast run: {}\n", run.notification_message().replace('\n', " ")));
    }
    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::container::{Color, Container, Icon};
    use crate::storage::StoredState;

    #[test]
    fn test_format_human_lists_containers() {
        let mut state = StoredState::default();
        let mut container = Container::new("tmp3".to_string(), 3, Color::Pink, Icon::Pet, true);
        container.history.insert("https://a.example".to_string(), 1);
        state.containers.insert("container-3".to_string(), container);
        state.statistics.containers_deleted = 2;

        let output = format_human(&Snapshot::from_stored(&state));
        assert!(output.contains("tmp3 (container-3) - color: pink, icon: pet"));
        assert!(output.contains("deletes history: yes"));
        assert!(output.contains("history: 1"));
        assert!(output.contains("Containers deleted: 2"));
    }

    #[test]
    fn test_format_human_empty() {
        let output = format_human(&Snapshot::from_stored(&StoredState::default()));
        assert!(output.contains("(none)"));
        assert!(!output.contains("Last run"));
    }
}
