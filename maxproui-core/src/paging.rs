//! List paging for A8
//!
//! The panel asks for one page of four rows at a time by start index. At
//! the root, rows come from storage with a synthetic "Special Menu" row
//! in front; inside the special menu, rows come from the menu catalog.
//! Only the requested rows are ever built.

use core::ops::Range;

use heapless::{String, Vec};
use maxproui_protocol::{truncate_label, Reply, FULL_LABEL_LEN, SHORT_LABEL_LEN};

use crate::catalog::{MenuCatalog, SPECIAL_MENU_KEY, SPECIAL_MENU_LABEL};
use crate::dispatch::DispatchQueue;
use crate::session::SelectionContext;
use crate::traits::FileListing;

/// Rows per page
pub const PAGE_SIZE: usize = 4;

/// One list row
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRow {
    /// Label the panel echoes back on selection
    pub full: String<FULL_LABEL_LEN>,
    /// Label shown on screen
    pub short: String<SHORT_LABEL_LEN>,
}

impl PageRow {
    pub fn new(full: &str, short: &str) -> Self {
        Self {
            full: truncate_label(full),
            short: truncate_label(short),
        }
    }
}

/// One page of rows
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Page {
    rows: Vec<PageRow, PAGE_SIZE>,
    has_special_entry: bool,
}

impl Page {
    pub fn rows(&self) -> &[PageRow] {
        &self.rows
    }

    /// Whether the first row is the synthetic special menu entry
    pub fn has_special_entry(&self) -> bool {
        self.has_special_entry
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// List transfer: `FN `, two lines per row, `END`
    pub fn replies(&self) -> impl Iterator<Item = Reply> + '_ {
        let rows = self.rows.iter().flat_map(|row| {
            [
                Reply::ListItem(row.full.clone()),
                Reply::ListItem(truncate_label(&row.short)),
            ]
        });
        core::iter::once(Reply::ListBegin)
            .chain(rows)
            .chain(core::iter::once(Reply::ListEnd))
    }

    fn push(&mut self, row: PageRow) {
        // Callers never ask for more than PAGE_SIZE rows
        let _ = self.rows.push(row);
    }
}

/// Index range of the page starting at `start`, clipped to `total`
pub fn page_bounds(start: usize, total: usize) -> Range<usize> {
    let end = start.saturating_add(PAGE_SIZE).min(total);
    start.min(end)..end
}

/// Special menu page
///
/// Every catalog entry gets a row, including a user `Exit` entry. The
/// panel has no other way out of the special menu.
pub fn catalog_page(catalog: &MenuCatalog, start: usize) -> Page {
    let mut page = Page::default();
    for index in page_bounds(start, catalog.len()) {
        if let Some(entry) = catalog.get(index) {
            page.push(PageRow::new(entry.key(), entry.name()));
        }
    }
    page
}

/// Storage page; index 0 is the special menu row, file `i` is at `i + 1`
pub fn storage_page<F: FileListing + ?Sized>(files: &F, start: usize) -> Page {
    let mut page = Page::default();
    let total = files.file_count().saturating_add(1);
    for index in page_bounds(start, total) {
        if index == 0 {
            page.has_special_entry = true;
            page.push(PageRow::new(SPECIAL_MENU_KEY, SPECIAL_MENU_LABEL));
        } else if let Some(file) = files.file_at(index - 1) {
            page.push(PageRow::new(&file.path, &file.path));
        }
    }
    page
}

/// Map a selected label back to a storage path
///
/// Labels were truncated on the way out, so the first file whose full
/// label matches (case-insensitive) wins. Unmatched labels are returned
/// as-is.
pub fn resolve_file_label<F: FileListing + ?Sized>(files: &F, label: &str) -> alloc::string::String {
    (0..files.file_count())
        .filter_map(|i| files.file_at(i))
        .find(|file| {
            truncate_label::<FULL_LABEL_LEN>(&file.path)
                .as_str()
                .eq_ignore_ascii_case(label)
        })
        .map(|file| file.path)
        .unwrap_or_else(|| alloc::string::String::from(label))
}

/// Builds pages against the session's selection state
///
/// Building a page is also the point where a confirmed special menu entry
/// runs: A26 only marks it, and the A8 that the panel always sends next
/// enqueues the script before the page is computed.
pub struct PageBuilder<'a> {
    catalog: &'a MenuCatalog,
    queue: &'a mut DispatchQueue,
}

impl<'a> PageBuilder<'a> {
    pub fn new(catalog: &'a MenuCatalog, queue: &'a mut DispatchQueue) -> Self {
        Self { catalog, queue }
    }

    /// Build the page for a list request starting at `requested_start`
    pub fn build<F: FileListing + ?Sized>(
        &mut self,
        ctx: &mut SelectionContext,
        files: &F,
        requested_start: usize,
    ) -> Page {
        if ctx.pending_execute {
            self.run_pending(ctx);
        }

        if ctx.special_menu_active {
            let start = if ctx.request_stay_on_page && ctx.show_last_page {
                ctx.last_shown_page_index
            } else {
                ctx.last_shown_page_index = requested_start;
                requested_start
            };
            ctx.show_last_page = false;
            catalog_page(self.catalog, start)
        } else {
            storage_page(files, requested_start)
        }
    }

    fn run_pending(&mut self, ctx: &mut SelectionContext) {
        ctx.pending_execute = false;
        let entry = ctx
            .last_user_selection
            .as_ref()
            .and_then(|key| self.catalog.resolve(key));
        match entry {
            Some(entry) => {
                if let Some(script) = entry.script() {
                    self.queue.enqueue(script);
                }
                ctx.request_stay_on_page = entry.stay_on_page();
                ctx.show_last_page = entry.show_last_page();
            }
            None => {
                ctx.request_stay_on_page = false;
                ctx.show_last_page = false;
            }
        }
    }
}
