use cairn_view::{AppView, MessageRow, NavItem, ThreadRow};

/// Plain-text frame for one render of the application.
pub fn render_app(view: &AppView, outstanding: usize) -> String {
    let mut lines = Vec::new();

    let mut header = format!("== {} ==", view.title);
    if let Some(profile) = &view.profile {
        let who = profile.name.as_deref().or(profile.email.as_deref());
        if let Some(who) = who {
            header.push_str(&format!("  ({who})"));
        }
    }
    if outstanding > 0 {
        header.push_str(&format!("  [loading {outstanding}]"));
    }
    lines.push(header);

    if view.show_login {
        lines.push("Signed out. Provide an access token and restart.".to_string());
        return lines.join("\n");
    }

    lines.push(nav_line(&view.nav));
    if !view.label_nav.is_empty() {
        lines.push(nav_line(&view.label_nav));
    }
    lines.push(String::new());

    if view.threads.is_empty() {
        lines.push("(no threads)".to_string());
    }
    for thread in &view.threads {
        render_thread(thread, &mut lines);
    }
    lines.join("\n")
}

fn nav_line(items: &[NavItem]) -> String {
    items
        .iter()
        .map(|item| {
            if item.selected {
                format!("[{}]", item.title)
            } else {
                item.title.clone()
            }
        })
        .collect::<Vec<_>>()
        .join("  ")
}

fn render_thread(thread: &ThreadRow, lines: &mut Vec<String>) {
    let marker = if thread.unread { "*" } else { " " };
    let from = thread
        .from
        .as_ref()
        .map_or("...", |address| address.name.as_str());
    let date = thread.date.as_deref().unwrap_or("");
    let mut header = format!("{marker} {from}");
    if !thread.to.is_empty() {
        let to = thread
            .to
            .iter()
            .map(|address| address.name.as_str())
            .collect::<Vec<_>>()
            .join(", ");
        header.push_str(&format!(" to {to}"));
    }
    header.push_str(&format!(" | {date}"));
    lines.push(header);

    let subject = thread.subject.as_deref().unwrap_or("");
    if thread.labels.is_empty() {
        lines.push(format!("  {subject}"));
    } else {
        lines.push(format!("  {subject} <{}>", thread.labels.join(", ")));
    }

    if thread.open {
        for message in &thread.messages {
            render_message(message, lines);
        }
    } else if let Some(snippet) = &thread.snippet {
        lines.push(format!("  {snippet}"));
    }
}

fn render_message(message: &MessageRow, lines: &mut Vec<String>) {
    let from = message.from_name.as_deref().unwrap_or("unknown sender");
    match (&message.body, message.open) {
        (Some(body), true) => {
            lines.push(format!("    {from}:"));
            for line in body.visible.lines() {
                lines.push(format!("      {line}"));
            }
            if body.quoted.is_some() {
                lines.push("      [quoted text hidden]".to_string());
            }
        }
        _ => lines.push(format!(
            "    {from}: {}",
            message.snippet.as_deref().unwrap_or("")
        )),
    }
    for attachment in &message.attachments {
        lines.push(format!("      attachment: {attachment}"));
    }
}
