// ============================================================================
// LAYOUT TEMPLATES — built-in catalog, id → LayoutSpec resolution
// ============================================================================
//
// Templates are grouped in category buckets for the picker UI. Resolution
// is nullable: an unknown id returns `None` and the caller degrades to the
// resolver's fallback grid. Track strings go through `parse_tracks`, so a
// typo in this table can never panic either.

use crate::collage::{AreaGrid, LayoutSpec};
use crate::ops::layout::parse_tracks;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Category {
    Grids,
    Strips,
    Feature,
}

impl Category {
    pub fn label(&self) -> &'static str {
        match self {
            Category::Grids => "Grids",
            Category::Strips => "Strips",
            Category::Feature => "Feature",
        }
    }

    pub fn all() -> &'static [Category] {
        &[Category::Grids, Category::Strips, Category::Feature]
    }
}

pub struct Template {
    pub id: &'static str,
    pub label: &'static str,
    pub category: Category,
    /// Suggested panel count when switching to this template.
    pub panel_count: usize,
    columns: &'static str,
    rows: &'static str,
    /// Area names row-major + column count, with one name per panel index.
    areas: Option<(&'static [&'static str], usize, &'static [&'static str])>,
}

pub const TEMPLATES: &[Template] = &[
    // -- Grids ---------------------------------------------------------------
    Template { id: "grid-2x2", label: "2 × 2", category: Category::Grids, panel_count: 4, columns: "repeat(2)", rows: "repeat(2)", areas: None },
    Template { id: "grid-3x3", label: "3 × 3", category: Category::Grids, panel_count: 9, columns: "repeat(3)", rows: "repeat(3)", areas: None },
    Template { id: "grid-3x2", label: "3 × 2", category: Category::Grids, panel_count: 6, columns: "repeat(3)", rows: "repeat(2)", areas: None },
    Template { id: "split-v", label: "Side by side", category: Category::Grids, panel_count: 2, columns: "1 1", rows: "1", areas: None },
    Template { id: "split-h", label: "Stacked", category: Category::Grids, panel_count: 2, columns: "1", rows: "1 1", areas: None },
    Template { id: "golden-v", label: "Golden split", category: Category::Grids, panel_count: 2, columns: "1.618 1", rows: "1", areas: None },
    // -- Strips --------------------------------------------------------------
    Template { id: "strip-3", label: "Triptych", category: Category::Strips, panel_count: 3, columns: "repeat(3)", rows: "1", areas: None },
    Template { id: "strip-4", label: "Filmstrip", category: Category::Strips, panel_count: 4, columns: "repeat(4)", rows: "1", areas: None },
    Template { id: "rows-3", label: "Three rows", category: Category::Strips, panel_count: 3, columns: "1", rows: "repeat(3)", areas: None },
    // -- Feature layouts (named areas) ----------------------------------------
    Template {
        id: "feature-left",
        label: "Feature left",
        category: Category::Feature,
        panel_count: 3,
        columns: "2 1",
        rows: "1 1",
        areas: Some((&["main", "top", "main", "bottom"], 2, &["main", "top", "bottom"])),
    },
    Template {
        id: "feature-top",
        label: "Feature top",
        category: Category::Feature,
        panel_count: 3,
        columns: "1 1",
        rows: "2 1",
        areas: Some((&["hero", "hero", "left", "right"], 2, &["hero", "left", "right"])),
    },
    Template {
        id: "mosaic-3",
        label: "Mosaic",
        category: Category::Feature,
        panel_count: 3,
        columns: "1 1 1",
        rows: "1 1",
        areas: Some((
            &["big", "big", "a", "big", "big", "b"],
            3,
            &["big", "a", "b"],
        )),
    },
];

/// Template record by id.
pub fn template(id: &str) -> Option<&'static Template> {
    TEMPLATES.iter().find(|t| t.id == id)
}

/// Resolve a template id to a concrete layout spec. `None` for unknown ids;
/// the caller falls back to a square-ish grid.
pub fn resolve_template(id: &str) -> Option<LayoutSpec> {
    let t = template(id)?;
    let columns = parse_tracks(t.columns).weights_or_equal(1);
    let rows = parse_tracks(t.rows).weights_or_equal(1);
    let (areas, panel_areas) = match t.areas {
        Some((names, cols, per_panel)) => (
            Some(AreaGrid {
                cols,
                names: names.iter().map(|s| s.to_string()).collect(),
            }),
            Some(per_panel.iter().map(|s| s.to_string()).collect()),
        ),
        None => (None, None),
    };
    Some(LayoutSpec { columns, rows, areas, panel_areas })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ops::layout::resolve_panels;

    #[test]
    fn unknown_template_resolves_to_none() {
        assert!(resolve_template("no-such-layout").is_none());
    }

    #[test]
    fn every_template_yields_its_panel_count() {
        for t in TEMPLATES {
            let spec = resolve_template(t.id).expect(t.id);
            let panels = resolve_panels(&spec, t.panel_count, 900.0, 600.0, 8.0);
            assert_eq!(panels.len(), t.panel_count, "template {}", t.id);
            for p in &panels {
                assert!(p.width >= 1.0 && p.height >= 1.0, "template {}", t.id);
            }
        }
    }

    #[test]
    fn mosaic_big_area_spans_two_columns_and_both_rows() {
        let spec = resolve_template("mosaic-3").unwrap();
        let panels = resolve_panels(&spec, 3, 300.0, 200.0, 0.0);
        assert_eq!(panels[0].width, 200.0);
        assert_eq!(panels[0].height, 200.0);
    }
}
