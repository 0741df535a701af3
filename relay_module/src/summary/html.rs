//! Hypertext rendering of the daily aggregate.

use super::aggregate::{DailySummary, RoadmapSummary, WorkPackageSummary};
use super::digest::truncate_subject;

/// Render the aggregate as a standalone HTML document. When `base_url` is
/// known, work-package ids link back to the tracker.
pub fn render_html(summary: &DailySummary, base_url: Option<&str>) -> String {
    let mut out = String::new();
    out.push_str("<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n");
    out.push_str(&format!(
        "<title>Work-package summary for {}</title>\n",
        summary.date
    ));
    out.push_str(STYLE);
    out.push_str("</head>\n<body>\n");
    out.push_str(&format!(
        "<h1>Work-package summary for {}</h1>\n",
        summary.date
    ));

    push_section(&mut out, "Due today", &summary.due_today, base_url);
    push_section(&mut out, "Overdue", &summary.overdue, base_url);
    push_section(&mut out, "In progress", &summary.in_progress, base_url);
    push_roadmaps(&mut out, &summary.roadmaps);

    out.push_str("</body>\n</html>\n");
    out
}

const STYLE: &str = "<style>\n\
    body { font-family: sans-serif; margin: 2em; }\n\
    table { border-collapse: collapse; margin-bottom: 2em; }\n\
    th, td { border: 1px solid #ccc; padding: 0.4em 0.8em; text-align: left; }\n\
    .bar { width: 160px; height: 12px; background: #eee; }\n\
    .fill { height: 12px; background: #2f9e44; }\n\
</style>\n";

fn push_section(
    out: &mut String,
    title: &str,
    items: &[WorkPackageSummary],
    base_url: Option<&str>,
) {
    out.push_str(&format!("<h2>{}</h2>\n", escape(title)));
    if items.is_empty() {
        out.push_str("<p>none</p>\n");
        return;
    }
    out.push_str("<table>\n<tr><th>ID</th><th>Subject</th><th>Status</th><th>Assignee</th><th>Project</th><th>Due</th></tr>\n");
    for item in items {
        let id_cell = match base_url {
            Some(base) => format!(
                "<a href=\"{}/work_packages/{}\">#{}</a>",
                base.trim_end_matches('/'),
                item.id,
                item.id
            ),
            None => format!("#{}", item.id),
        };
        out.push_str(&format!(
            "<tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td></tr>\n",
            id_cell,
            escape(&truncate_subject(&item.subject)),
            escape(&item.status),
            escape(item.assignee.as_deref().unwrap_or("unassigned")),
            escape(item.project.as_deref().unwrap_or("-")),
            item.due_date
                .map(|date| date.to_string())
                .unwrap_or_else(|| "-".to_string()),
        ));
    }
    out.push_str("</table>\n");
}

fn push_roadmaps(out: &mut String, roadmaps: &[RoadmapSummary]) {
    out.push_str("<h2>Roadmaps</h2>\n");
    if roadmaps.is_empty() {
        out.push_str("<p>none</p>\n");
        return;
    }
    out.push_str("<table>\n<tr><th>Roadmap</th><th>Project</th><th>Due</th><th>Progress</th><th></th></tr>\n");
    for roadmap in roadmaps {
        out.push_str(&format!(
            "<tr><td>{}</td><td>{}</td><td>{}</td><td>{}% ({}/{})</td>\
             <td><div class=\"bar\"><div class=\"fill\" style=\"width:{}%\"></div></div></td></tr>\n",
            escape(&roadmap.name),
            escape(roadmap.project.as_deref().unwrap_or("-")),
            roadmap
                .due_date
                .map(|date| date.to_string())
                .unwrap_or_else(|| "-".to_string()),
            roadmap.percent,
            roadmap.closed,
            roadmap.total,
            roadmap.percent,
        ));
    }
    out.push_str("</table>\n");
}

fn escape(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
