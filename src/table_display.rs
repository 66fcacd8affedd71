use comfy_table::{Attribute, Cell, ContentArrangement, Table};
use crossterm::style::Stylize;
use filterable_table::{PageLink, PageState, Paginator, RenderedPage};

pub fn display_page(page: &RenderedPage) {
    if page.cells.is_empty() {
        println!("{}", "No rows match the current filters.".yellow());
        return;
    }

    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);

    let headers: Vec<Cell> = page
        .headers
        .iter()
        .map(|h| Cell::new(h).add_attribute(Attribute::Bold))
        .collect();
    table.set_header(headers);

    for row in &page.cells {
        table.add_row(row);
    }

    println!("{table}");
}

/// Status line plus the page link strip, e.g. `1 … 4 [5] 6 … 12`
pub fn display_page_links(total_rows: usize, raw_rows: usize, page: &PageState) {
    let last = page.last_page(total_rows);
    println!(
        "\n{}",
        format!(
            "{} of {} rows, page {} of {} ({} per page)",
            total_rows,
            raw_rows,
            page.number(),
            last,
            page.rows()
        )
        .green()
    );

    let links = Paginator::page_links(total_rows, page);
    if links.is_empty() {
        return;
    }

    let strip: Vec<String> = links
        .iter()
        .map(|link| match link {
            PageLink::Page {
                number,
                active: true,
            } => format!("[{}]", number).bold().to_string(),
            PageLink::Page { number, .. } => number.to_string(),
            PageLink::Ellipsis => "…".to_string(),
        })
        .collect();
    println!("{}", strip.join(" "));
}
