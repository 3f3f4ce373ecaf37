//! End-to-end tests for structure reconstruction.

use proptest::prelude::*;
use relayout::layout::{resolve_font, StyleCache};
use relayout::{
    build_structure, Alignment, BlockType, ConvertOptions, DocumentInput, DocumentStructure, Error,
    Metadata, PageInput, TextItem,
};

fn item(text: &str, x: f32, y: f32, width: f32, size: f32, font: &str) -> TextItem {
    TextItem::new(text, x, y, size, font).with_width(width)
}

fn single_page(items: Vec<TextItem>) -> DocumentInput {
    let mut input = DocumentInput::new();
    input.add_page(PageInput::letter(1).with_items(items));
    input
}

fn analyze(input: &DocumentInput) -> DocumentStructure {
    build_structure(input, &ConvertOptions::default()).unwrap()
}

// ==================== Scenarios ====================

#[test]
fn test_items_on_one_line_form_a_paragraph() {
    let doc = analyze(&single_page(vec![
        item("Alpha", 50.0, 100.0, 95.0, 12.0, "ArialMT"),
        item("beta", 150.0, 100.0, 95.0, 12.0, "ArialMT"),
        item("gamma", 250.0, 100.0, 95.0, 12.0, "ArialMT"),
    ]));

    let page = &doc.pages[0];
    assert_eq!(page.blocks.len(), 1);
    assert!(page.tables.is_empty());

    let block = &page.blocks[0];
    assert_eq!(block.block_type, BlockType::Paragraph);
    assert_eq!(block.style.alignment, Alignment::Left);
    assert_eq!(block.style.indent, 50.0);
    assert_eq!(
        block.text.split_whitespace().collect::<Vec<_>>(),
        ["Alpha", "beta", "gamma"]
    );
}

#[test]
fn test_centered_bold_chapter_is_heading() {
    let doc = analyze(&single_page(vec![
        item("CHAPTER 1", 256.0, 150.0, 100.0, 18.0, "Arial-BoldMT"),
        item("The story begins here.", 72.0, 220.0, 140.0, 12.0, "ArialMT"),
    ]));

    let heading = &doc.pages[0].blocks[0];
    assert_eq!(heading.block_type, BlockType::Heading);
    assert_eq!(heading.style.alignment, Alignment::Center);
    assert!(heading.style.has_bold);
    assert_eq!(relayout::render::docx::heading_level(heading.style.font_size), 1);

    assert_eq!(doc.pages[0].blocks[1].block_type, BlockType::Paragraph);
}

#[test]
fn test_aligned_grid_is_table() {
    let mut items = Vec::new();
    let rows = [["Name", "Age", "City"], ["Alice", "30", "Seoul"], ["Bob", "25", "Busan"]];
    for (r, row) in rows.iter().enumerate() {
        for (c, text) in row.iter().enumerate() {
            let font = if r == 0 { "Arial-BoldMT" } else { "ArialMT" };
            items.push(item(text, 72.0 + c as f32 * 180.0, 200.0 + r as f32 * 20.0, 50.0, 12.0, font));
        }
    }
    let doc = analyze(&single_page(items));

    let page = &doc.pages[0];
    assert_eq!(page.tables.len(), 1);
    assert!(page.blocks.is_empty());

    let table = &page.tables[0];
    assert_eq!(table.column_count, 3);
    assert_eq!(table.row_count(), 3);
    assert!(table.has_header());
    assert_eq!(table.rows[1].cells[2].text, "Seoul");
}

#[test]
fn test_bullet_line_is_list() {
    let doc = analyze(&single_page(vec![item(
        "• Item one",
        72.0,
        300.0,
        60.0,
        12.0,
        "ArialMT",
    )]));

    let block = &doc.pages[0].blocks[0];
    assert_eq!(block.block_type, BlockType::List);
    assert_eq!(relayout::render::docx::list_level(block.style.indent - 72.0), 0);
}

#[test]
fn test_empty_page_still_produces_document() {
    let mut input = single_page(vec![item("Hello", 72.0, 100.0, 30.0, 12.0, "ArialMT")]);
    input.add_page(PageInput::letter(2));

    let doc = analyze(&input);
    assert_eq!(doc.page_count(), 2);
    assert!(doc.pages[1].blocks.is_empty());
    assert!(doc.pages[1].is_empty());

    let bytes = relayout::render::to_docx(&doc, &Default::default()).unwrap();
    assert!(!bytes.is_empty());
}

// ==================== Input handling ====================

#[test]
fn test_no_items_and_no_metadata_is_input_empty() {
    let mut input = DocumentInput::new();
    input.add_page(PageInput::letter(1).with_items(vec![item("   ", 0.0, 0.0, 0.0, 12.0, "Arial")]));
    let result = build_structure(&input, &ConvertOptions::default());
    assert!(matches!(result, Err(Error::InputEmpty)));
}

#[test]
fn test_missing_metadata_gives_empty_strings() {
    let doc = analyze(&single_page(vec![item("Hello", 72.0, 100.0, 30.0, 12.0, "ArialMT")]));
    assert_eq!(doc.title, "");
    assert_eq!(doc.author, "");
    assert_eq!(doc.subject, "");
}

#[test]
fn test_metadata_is_carried() {
    let mut input = single_page(vec![item("Hello", 72.0, 100.0, 30.0, 12.0, "ArialMT")]);
    input.metadata = Some(Metadata {
        title: "Annual Report".to_string(),
        author: "Finance".to_string(),
        ..Default::default()
    });
    let doc = analyze(&input);
    assert_eq!(doc.title, "Annual Report");
    assert_eq!(doc.author, "Finance");
}

#[test]
fn test_malformed_page_degrades_to_empty() {
    let mut input = single_page(vec![item("Fine", 72.0, 100.0, 30.0, 12.0, "ArialMT")]);
    input.add_page(PageInput::letter(2).with_items(vec![item(
        "Broken",
        f32::NAN,
        100.0,
        30.0,
        12.0,
        "ArialMT",
    )]));

    let doc = analyze(&input);
    assert_eq!(doc.page_count(), 2);
    assert_eq!(doc.pages[0].blocks[0].text, "Fine");
    assert!(doc.pages[1].is_empty());
}

#[test]
fn test_json_input_round_trip() {
    let json = r#"{
        "metadata": {"title": "Memo"},
        "pages": [{
            "number": 1,
            "items": [
                {"text": "Dear team,", "x": 72, "y": 120, "fontSize": 12, "sourceFontName": "ABCDEF+TimesNewRomanPSMT"},
                {"text": "Thanks.", "x": 72, "y": 200, "fontSize": 12, "sourceFontName": "ABCDEF+TimesNewRomanPSMT"}
            ]
        }]
    }"#;
    let input = DocumentInput::from_json(json).unwrap();
    let doc = analyze(&input);

    assert_eq!(doc.title, "Memo");
    assert_eq!(doc.pages[0].blocks.len(), 2);
    assert_eq!(doc.pages[0].blocks[0].style.font_family, "Times New Roman");
}

#[test]
fn test_pages_keep_input_order_in_parallel() {
    let mut input = DocumentInput::new();
    for n in 1..=12 {
        input.add_page(PageInput::letter(n).with_items(vec![item(
            &format!("Page body {}", n),
            72.0,
            300.0,
            80.0,
            12.0,
            "ArialMT",
        )]));
    }
    let doc = analyze(&input);
    let numbers: Vec<u32> = doc.pages.iter().map(|p| p.number).collect();
    assert_eq!(numbers, (1..=12).collect::<Vec<_>>());
    assert_eq!(doc.pages[11].blocks[0].text, "Page body 12");
}

// ==================== Properties ====================

fn arb_item() -> impl Strategy<Value = TextItem> {
    (
        "[a-zA-Z]{1,8}",
        0.0f32..560.0,
        0.0f32..780.0,
        6.0f32..24.0,
        any::<bool>(),
    )
        .prop_map(|(text, x, y, size, bold)| TextItem::new(text, x, y, size, "Arial").with_bold(bold))
}

fn arb_font_name() -> impl Strategy<Value = String> {
    prop::sample::select(vec![
        "ABCDEF+TimesNewRomanPS-BoldItalicMT",
        "Helvetica-Oblique",
        "Arial-BoldMT",
        "CourierNewPSMT",
        "Calibri-Light",
        "Garamond-Demi",
        "SourceSansPro-Black",
        "UnknownFont",
        "",
    ])
    .prop_map(str::to_string)
}

proptest! {
    #[test]
    fn prop_every_item_lands_in_exactly_one_place(items in prop::collection::vec(arb_item(), 1..40)) {
        let input = single_page(items.clone());
        let doc = build_structure(&input, &ConvertOptions::default().with_parallel(false)).unwrap();
        let page = &doc.pages[0];

        let mut placed: Vec<String> = page
            .headers
            .iter()
            .chain(&page.blocks)
            .chain(&page.footers)
            .flat_map(|b| b.items.iter().map(|i| i.text.clone()))
            .chain(page.tables.iter().flat_map(|t| t.items.iter().map(|i| i.text.clone())))
            .collect();
        let mut expected: Vec<String> = items.iter().map(|i| i.text.clone()).collect();
        placed.sort();
        expected.sort();
        prop_assert_eq!(placed, expected);

        for table in &page.tables {
            for row in &table.rows {
                prop_assert!(table.column_count >= row.cells.len());
                prop_assert!(table.column_count >= row.span_width());
            }
        }
        for block in page.headers.iter().chain(&page.blocks).chain(&page.footers) {
            prop_assert!(block.items.iter().all(|i| block.bounds.contains(i)));
        }
    }

    #[test]
    fn prop_style_cache_is_transparent(name in arb_font_name()) {
        let mut cache = StyleCache::new();
        let direct = resolve_font(&name);
        prop_assert_eq!(cache.resolve(&name).clone(), direct.clone());
        prop_assert_eq!(cache.resolve(&name).clone(), direct.clone());
        prop_assert_eq!(cache.len(), 1);
        prop_assert_eq!(resolve_font(&direct.family).family, direct.family);
    }
}
