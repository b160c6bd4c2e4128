use crate::coordinator::{Direction, Notice, NoticeLevel, OfferState, ProgressDisplay, ViewState};

pub fn progress_line(direction: Direction, progress: Option<ProgressDisplay>) -> String {
    match progress {
        Some(p) => format!("{} progress: {}/{}", direction.label(), p.done, p.total),
        None => format!("{} progress: -", direction.label()),
    }
}

pub fn offer_panel(view: &ViewState) -> Vec<String> {
    match &view.offer {
        OfferState::OfferPending { seq, offer } => vec![
            format!("incoming file offer #{seq}"),
            format!("  filename: {}", offer.filename),
            format!("  chunks:   {}", offer.total_chunks),
            format!("  hash:     {}", offer.file_hash),
            "  type 'accept' or 'reject'".to_string(),
        ],
        _ => Vec::new(),
    }
}

/// Full view, as printed by the `status` command.
pub fn render_view(view: &ViewState) -> String {
    let mut lines = Vec::new();

    let channel = if view.push_connected {
        "connected"
    } else {
        "disconnected"
    };
    lines.push(format!("notifications: {channel}"));

    let panel = offer_panel(view);
    if panel.is_empty() {
        lines.push("no pending offer".to_string());
    } else {
        lines.extend(panel);
    }
    if let Some(decision) = &view.last_decision {
        let verb = if decision.accepted { "accepted" } else { "rejected" };
        lines.push(format!("last offer: {verb} '{}'", decision.filename));
    }

    lines.push(progress_line(Direction::Send, view.send_progress));
    lines.push(progress_line(Direction::Receive, view.receive_progress));

    if view.peers.is_empty() {
        lines.push("peers: none".to_string());
    } else {
        lines.push("peers:".to_string());
        for peer in &view.peers {
            let marker = if view.selected_target.as_ref() == Some(peer) {
                '*'
            } else {
                ' '
            };
            lines.push(format!(" {marker} {peer}"));
        }
    }
    if let Some(target) = &view.selected_target {
        if !view.peers.contains(target) {
            lines.push(format!("target: {target} (not listed)"));
        }
    }

    match &view.selected_file {
        Some(file) => lines.push(format!("file: {}", file.display())),
        None => lines.push("file: none".to_string()),
    }

    lines.join("\n")
}

/// Lines worth printing when the view moves from `prev` to `next`.
pub fn render_changes(prev: &ViewState, next: &ViewState) -> Vec<String> {
    let mut lines = Vec::new();

    if next.offer_seq != prev.offer_seq && next.offer.is_pending() {
        if prev.offer.is_pending() {
            lines.push("previous offer replaced".to_string());
        }
        lines.extend(offer_panel(next));
    }

    for direction in [Direction::Send, Direction::Receive] {
        let progress = next.progress(direction);
        if progress != prev.progress(direction) {
            lines.push(progress_line(direction, progress));
        }
    }

    if next.peers != prev.peers {
        if next.peers.is_empty() {
            lines.push("peers: none".to_string());
        } else {
            let names: Vec<&str> = next.peers.iter().map(|p| p.as_str()).collect();
            lines.push(format!("peers: {}", names.join(", ")));
        }
    }

    if next.selected_target != prev.selected_target {
        if let Some(target) = &next.selected_target {
            lines.push(format!("target: {target}"));
        }
    }

    lines
}

pub fn render_notice(notice: &Notice) -> String {
    let time = notice.at.with_timezone(&chrono::Local).format("%H:%M:%S");
    match notice.level {
        NoticeLevel::Info => format!("[{time}] {}", notice.text),
        NoticeLevel::Error => format!("[{time}] error: {}", notice.text),
    }
}
