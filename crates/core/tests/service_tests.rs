// ═══════════════════════════════════════════════════════════════════
// Service Tests — CatalogService, QueryService, ImportService,
// MutationService
// ═══════════════════════════════════════════════════════════════════

use market_research_core::errors::CoreError;
use market_research_core::models::filter::RecordFilter;
use market_research_core::models::layout::SheetLayout;
use market_research_core::models::record::{Category, Record, RecordSet, StoredRecord, TradeType};
use market_research_core::models::settings::Settings;
use market_research_core::services::catalog_service::CatalogService;
use market_research_core::services::import_service::ImportService;
use market_research_core::services::mutation_service::MutationService;
use market_research_core::services::query_service::QueryService;
use market_research_core::services::record_store::RecordStore;
use market_research_core::sheets::memory::InMemorySheet;
use market_research_core::sheets::traits::SheetClient;

// ═══════════════════════════════════════════════════════════════════
// Fixtures
// ═══════════════════════════════════════════════════════════════════

fn set_of(records: Vec<Record>) -> RecordSet {
    let mut set = RecordSet::empty(SheetLayout::canonical());
    set.records = records
        .into_iter()
        .enumerate()
        .map(|(i, record)| StoredRecord {
            row_id: i as u32 + 2,
            key: None,
            record,
        })
        .collect();
    set
}

fn market() -> RecordSet {
    set_of(vec![
        Record::sell("Brel", Category::OresIngots, "Iron", 12),
        Record::buy("Alba", Category::OresIngots, "Iron", 5),
        Record::sell("Alba", Category::OresIngots, "Gold", 20),
        Record::sell("Cora", Category::Potions, "Healing", 30),
        Record::sell("Alba", Category::OresIngots, "Iron", 12).with_note("second"),
        Record::buy("Cora", Category::OresIngots, "Iron ore", 2),
        Record::buy("Brel", Category::Potions, "Healing", 25),
    ])
}

const HEADER: &[&str] = &["country", "category", "trade_type", "item_name", "price", "note", "id"];

// ═══════════════════════════════════════════════════════════════════
// CatalogService
// ═══════════════════════════════════════════════════════════════════

mod catalog {
    use super::*;

    #[test]
    fn distinct_countries_sorted() {
        let countries: Vec<String> = CatalogService::new()
            .distinct_countries(&market())
            .into_iter()
            .collect();
        assert_eq!(countries, vec!["Alba", "Brel", "Cora"]);
    }

    #[test]
    fn distinct_items_all() {
        let items: Vec<String> = CatalogService::new()
            .distinct_items(&market(), None)
            .into_iter()
            .collect();
        assert_eq!(items, vec!["Gold", "Healing", "Iron", "Iron ore"]);
    }

    #[test]
    fn distinct_items_by_category() {
        let items: Vec<String> = CatalogService::new()
            .distinct_items(&market(), Some(Category::Potions))
            .into_iter()
            .collect();
        assert_eq!(items, vec!["Healing"]);

        let none = CatalogService::new().distinct_items(&market(), Some(Category::MobDrops));
        assert!(none.is_empty());
    }

    #[test]
    fn empty_set_gives_empty_catalog() {
        let svc = CatalogService::new();
        let empty = RecordSet::default();
        assert!(svc.distinct_countries(&empty).is_empty());
        assert!(svc.distinct_items(&empty, None).is_empty());
        assert!(svc.distinct_items(&empty, Some(Category::Other)).is_empty());
    }

    #[test]
    fn categories_are_fixed() {
        assert_eq!(CatalogService::new().categories(), &Category::ALL[..]);
    }
}

// ═══════════════════════════════════════════════════════════════════
// QueryService
// ═══════════════════════════════════════════════════════════════════

mod query {
    use super::*;

    #[test]
    fn no_constraints_is_identity() {
        let set = market();
        let out = QueryService::new().filter(&set, &RecordFilter::new());
        assert_eq!(out, set);
    }

    #[test]
    fn trade_type_filter() {
        let out = QueryService::new().filter(&market(), &RecordFilter::new().trade_type(TradeType::Buy));
        assert_eq!(out.len(), 3);
        assert!(out.iter().all(|r| r.record.trade_type == TradeType::Buy));
    }

    #[test]
    fn category_filter_is_membership() {
        let filter = RecordFilter::new().categories([Category::Potions, Category::MobDrops]);
        let out = QueryService::new().filter(&market(), &filter);
        assert_eq!(out.len(), 2);
        assert!(out.iter().all(|r| r.record.category == Category::Potions));
    }

    #[test]
    fn text_filter_is_substring() {
        let out = QueryService::new().filter(&market(), &RecordFilter::new().text("Iron"));
        assert_eq!(out.len(), 4);
    }

    #[test]
    fn filters_compose_and_keep_row_ids() {
        let filter = RecordFilter::new()
            .trade_type(TradeType::Buy)
            .category(Category::OresIngots)
            .text("ore");
        let out = QueryService::new().filter(&market(), &filter);
        assert_eq!(out.len(), 1);
        assert_eq!(out.records[0].row_id, 7);
        assert_eq!(out.records[0].record.item_name, "Iron ore");
    }

    #[test]
    fn compare_exact_match_sorted_by_price() {
        let c = QueryService::new().compare(&market(), "Iron");
        assert_eq!(c.item_name, "Iron");
        assert_eq!(c.entries.len(), 3);
        let prices: Vec<u64> = c.entries.iter().map(|e| e.record.price).collect();
        assert_eq!(prices, vec![5, 12, 12]);
        assert!(c.entries.iter().all(|e| e.record.item_name == "Iron"));
    }

    #[test]
    fn compare_ties_keep_sheet_order() {
        let c = QueryService::new().compare(&market(), "Iron");
        // Both 12-priced rows: Brel (row 2) before Alba (row 6).
        assert_eq!(c.entries[1].row_id, 2);
        assert_eq!(c.entries[2].row_id, 6);
    }

    #[test]
    fn compare_splits_sides() {
        let c = QueryService::new().compare(&market(), "Healing");
        assert_eq!(c.sell.len(), 1);
        assert_eq!(c.buy.len(), 1);
        assert_eq!(c.entries[0].record.country, "Brel");
        assert_eq!(c.cheapest(TradeType::Sell).unwrap().record.price, 30);
    }

    #[test]
    fn compare_unknown_item_is_empty() {
        let c = QueryService::new().compare(&market(), "Diamond");
        assert!(c.is_empty());
        assert!(c.sell.is_empty());
        assert!(c.buy.is_empty());
    }
}

// ═══════════════════════════════════════════════════════════════════
// ImportService
// ═══════════════════════════════════════════════════════════════════

mod import {
    use super::*;

    #[test]
    fn suffix_marks_trade_type() {
        let records = ImportService::default()
            .parse_str(r#"{"Alba": {"Ores": {"Iron (buy)": 5, "Gold": 20}}}"#)
            .unwrap();
        assert_eq!(
            records,
            vec![
                Record::buy("Alba", Category::OresIngots, "Iron", 5).with_note("bulk-imported"),
                Record::sell("Alba", Category::OresIngots, "Gold", 20).with_note("bulk-imported"),
            ]
        );
    }

    #[test]
    fn document_order_is_preserved() {
        let text = r#"{
            "Zeta": {"Potions": {"Mana": 9, "Healing (sell)": 4}},
            "Alba": {"Other": {"Stick": 1}, "Ores": {"Coal": "3"}}
        }"#;
        let records = ImportService::default().parse_str(text).unwrap();
        let names: Vec<&str> = records.iter().map(|r| r.item_name.as_str()).collect();
        assert_eq!(names, vec!["Mana", "Healing", "Stick", "Coal"]);
        assert_eq!(records[3].price, 3);
    }

    #[test]
    fn markers_from_settings() {
        let settings = Settings {
            sell_marker: "(販売)".into(),
            buy_marker: "(買取)".into(),
            import_note: "一括登録".into(),
            ..Settings::default()
        };
        let records = ImportService::from_settings(&settings)
            .parse_str(r#"{"アルバ": {"鉱石・インゴット": {"鉄 (買取)": 5, "金 (販売)": 20}}}"#)
            .unwrap();
        assert_eq!(records[0].trade_type, TradeType::Buy);
        assert_eq!(records[0].item_name, "鉄");
        assert_eq!(records[1].trade_type, TradeType::Sell);
        assert_eq!(records[1].note, "一括登録");
    }

    #[test]
    fn empty_document_gives_nothing() {
        assert!(ImportService::default().parse_str("{}").unwrap().is_empty());
    }

    fn import_err(text: &str) -> String {
        match ImportService::default().parse_str(text) {
            Err(CoreError::ImportFormat(msg)) => msg,
            other => panic!("expected ImportFormat error, got {other:?}"),
        }
    }

    #[test]
    fn invalid_json() {
        assert!(import_err("{\"Alba\": ").contains("not valid JSON"));
    }

    #[test]
    fn wrong_nesting() {
        assert!(import_err("[1, 2]").contains("expected an object of countries"));
        assert!(import_err(r#"{"Alba": 5}"#).contains("Alba"));
        assert!(import_err(r#"{"Alba": {"Ores": [1]}}"#).contains("Alba / Ores"));
    }

    #[test]
    fn non_numeric_price() {
        let msg = import_err(r#"{"Alba": {"Ores": {"Gold": 20, "Iron": "cheap"}}}"#);
        assert!(msg.contains("Alba / Ores / Iron"));
        assert!(msg.contains("non-negative integer"));
    }

    #[test]
    fn negative_and_fractional_prices() {
        assert!(import_err(r#"{"Alba": {"Ores": {"Iron": -3}}}"#).contains("Iron"));
        assert!(import_err(r#"{"Alba": {"Ores": {"Iron": 2.5}}}"#).contains("Iron"));
        assert!(import_err(r#"{"Alba": {"Ores": {"Iron": null}}}"#).contains("Iron"));
    }

    #[test]
    fn unknown_category() {
        assert!(import_err(r#"{"Alba": {"Spaceships": {"Rocket": 900}}}"#).contains("unknown category"));
    }

    #[test]
    fn empty_names() {
        assert!(import_err(r#"{" ": {"Ores": {"Iron": 1}}}"#).contains("empty country"));
        assert!(import_err(r#"{"Alba": {"Ores": {" (buy)": 1}}}"#).contains("empty item name"));
    }
}

// ═══════════════════════════════════════════════════════════════════
// MutationService
// ═══════════════════════════════════════════════════════════════════

mod mutation {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn seeded() -> InMemorySheet {
        InMemorySheet::from_strs(&[
            HEADER,
            &["Alba", "Ores & Ingots", "sell", "Iron", "12", "", "9b2f7c1e-3c1a-4d7b-9a55-0a5f0c7b1d21"],
            &["Brel", "Potions", "buy", "Healing", "25", "", "4e0b3d62-8f8e-4a53-b1a4-5f1f7e2c9a10"],
        ])
    }

    async fn load(sheet: &InMemorySheet) -> RecordSet {
        RecordStore::new().load(sheet).await.unwrap()
    }

    #[tokio::test]
    async fn append_returns_next_row_and_generates_key() {
        let sheet = seeded();
        let current = load(&sheet).await;
        let row = MutationService::new()
            .append(&sheet, &current, &Record::sell("Cora", Category::Other, "Stick", 1))
            .await
            .unwrap();
        assert_eq!(row, 4);
        let after = load(&sheet).await;
        assert_eq!(after.len(), 3);
        assert!(after.get_by_row(4).unwrap().key.is_some());
    }

    #[tokio::test]
    async fn append_requires_country_and_item() {
        let sheet = seeded();
        let current = load(&sheet).await;
        let svc = MutationService::new();

        let err = svc
            .append(&sheet, &current, &Record::sell(" ", Category::Other, "Stick", 1))
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::Validation(_)));
        let err = svc
            .append(&sheet, &current, &Record::sell("Cora", Category::Other, "", 1))
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::Validation(_)));
        assert_eq!(sheet.row_count(), 3);
    }

    #[tokio::test]
    async fn append_to_empty_sheet_writes_header_first() {
        let sheet = InMemorySheet::new();
        let current = load(&sheet).await;
        let row = MutationService::new()
            .append(&sheet, &current, &Record::buy("Alba", Category::Other, "Stick", 1))
            .await
            .unwrap();
        assert_eq!(row, 2);
        let rows = sheet.rows();
        assert_eq!(rows[0], HEADER.iter().map(|s| s.to_string()).collect::<Vec<_>>());
        assert_eq!(rows[1][2], "buy");
    }

    #[tokio::test]
    async fn batch_is_all_or_nothing() {
        let sheet = seeded();
        let current = load(&sheet).await;
        let batch = vec![
            Record::sell("Cora", Category::Other, "Stick", 1),
            Record::sell("Cora", Category::Other, "", 1),
        ];
        let err = MutationService::new()
            .append_batch(&sheet, &current, &batch)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("record 2"));
        assert_eq!(sheet.row_count(), 3);
    }

    #[tokio::test]
    async fn batch_appends_in_order() {
        let sheet = seeded();
        let current = load(&sheet).await;
        let batch = vec![
            Record::sell("Cora", Category::Other, "Stick", 1),
            Record::buy("Dara", Category::Other, "Rope", 4),
        ];
        MutationService::new()
            .append_batch(&sheet, &current, &batch)
            .await
            .unwrap();
        let after = load(&sheet).await;
        assert_eq!(after.len(), 4);
        assert_eq!(after.records[2].record, batch[0]);
        assert_eq!(after.records[3].record, batch[1]);
    }

    #[tokio::test]
    async fn update_keeps_key_cell() {
        let sheet = seeded();
        let current = load(&sheet).await;
        let key = current.records[0].key;
        let replacement = Record::buy("Alba", Category::OresIngots, "Iron", 7).with_note("revised");
        MutationService::new()
            .update(&sheet, &current, 2, &replacement)
            .await
            .unwrap();
        let after = load(&sheet).await;
        assert_eq!(after.records[0].record, replacement);
        assert_eq!(after.records[0].key, key);
    }

    #[tokio::test]
    async fn update_unknown_row_fails() {
        let sheet = seeded();
        let current = load(&sheet).await;
        let svc = MutationService::new();
        let r = Record::sell("Alba", Category::Other, "Stick", 1);
        assert!(matches!(svc.update(&sheet, &current, 1, &r).await, Err(CoreError::RowNotFound(1))));
        assert!(matches!(svc.update(&sheet, &current, 4, &r).await, Err(CoreError::RowNotFound(4))));
    }

    #[tokio::test]
    async fn delete_shifts_rows() {
        let sheet = seeded();
        let current = load(&sheet).await;
        MutationService::new().delete(&sheet, &current, 2).await.unwrap();
        let after = load(&sheet).await;
        assert_eq!(after.len(), 1);
        assert_eq!(after.records[0].row_id, 2);
        assert_eq!(after.records[0].record.item_name, "Healing");
    }

    #[tokio::test]
    async fn key_addressing_survives_earlier_delete() {
        let sheet = seeded();
        let stale = load(&sheet).await;
        let healing_key = stale.records[1].key.unwrap();
        let svc = MutationService::new();

        svc.delete(&sheet, &stale, 2).await.unwrap();
        let written = svc
            .update_by_key(&sheet, healing_key, &Record::buy("Brel", Category::Potions, "Healing", 22))
            .await
            .unwrap();
        assert_eq!(written, 2);
        assert_eq!(load(&sheet).await.records[0].record.price, 22);

        svc.delete_by_key(&sheet, healing_key).await.unwrap();
        assert!(load(&sheet).await.is_empty());
    }

    #[tokio::test]
    async fn unknown_key_is_record_not_found() {
        let sheet = seeded();
        let err = MutationService::new()
            .delete_by_key(&sheet, uuid::Uuid::new_v4())
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::RecordNotFound(_)));
        assert_eq!(sheet.row_count(), 3);
    }

    fn legacy() -> InMemorySheet {
        InMemorySheet::from_strs(&[
            &["国名", "カテゴリ", "アイテム名", "価格", "備考"],
            &["アルバ", "鉱石・インゴット", "鉄", "5", ""],
        ])
    }

    #[tokio::test]
    async fn append_to_legacy_sheet_adds_trade_type_column() {
        let sheet = legacy();
        let current = load(&sheet).await;
        let gold = Record::buy("ブレル", Category::OresIngots, "金", 40);
        let row = MutationService::new()
            .append(&sheet, &current, &gold)
            .await
            .unwrap();
        assert_eq!(row, 3);

        let rows = sheet.rows();
        assert_eq!(rows[0][2], "取引種別");
        assert_eq!(rows[1][2], "");
        assert_eq!(rows[2].len(), 6);

        let after = load(&sheet).await;
        assert!(after.layout.has_trade_type());
        assert_eq!(after.records[0].record.trade_type, TradeType::Sell);
        assert_eq!(after.records[0].record.price, 5);
        assert_eq!(after.records[1].record, gold);
    }

    #[tokio::test]
    async fn batch_to_legacy_sheet_keeps_trade_types() {
        let sheet = legacy();
        let current = load(&sheet).await;
        let batch = vec![
            Record::buy("アルバ", Category::OresIngots, "鉄", 3),
            Record::sell("アルバ", Category::OresIngots, "金", 20),
        ];
        MutationService::new()
            .append_batch(&sheet, &current, &batch)
            .await
            .unwrap();
        let after = load(&sheet).await;
        assert_eq!(after.records[1].record, batch[0]);
        assert_eq!(after.records[2].record, batch[1]);
    }

    #[tokio::test]
    async fn update_on_legacy_sheet_writes_six_columns() {
        let sheet = legacy();
        let current = load(&sheet).await;
        let replacement = Record::buy("アルバ", Category::OresIngots, "鉄", 6);
        MutationService::new()
            .update(&sheet, &current, 2, &replacement)
            .await
            .unwrap();
        let rows = sheet.rows();
        assert_eq!(rows[1].len(), 6);
        assert_eq!(rows[1][2], "buy");
        assert_eq!(rows[1][4], "6");
        assert_eq!(load(&sheet).await.records[0].record, replacement);
    }

    #[tokio::test]
    async fn foreign_header_is_replaced_on_first_append() {
        let sheet = InMemorySheet::from_strs(&[&["Name", "Value"]]);
        let current = load(&sheet).await;
        let stick = Record::sell("Alba", Category::Other, "Stick", 1);
        let row = MutationService::new()
            .append(&sheet, &current, &stick)
            .await
            .unwrap();
        assert_eq!(row, 2);

        let after = load(&sheet).await;
        assert_eq!(after.len(), 1);
        assert_eq!(after.records[0].record, stick);
        assert!(after.records[0].key.is_some());
    }

    // ── Write counting ──────────────────────────────────────────────

    #[derive(Default)]
    struct CountingSheet {
        inner: InMemorySheet,
        writes: AtomicUsize,
    }

    impl CountingSheet {
        fn count(&self) {
            self.writes.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[async_trait]
    impl SheetClient for CountingSheet {
        fn name(&self) -> &str {
            "counting"
        }

        async fn read_all(&self) -> Result<Vec<Vec<String>>, CoreError> {
            self.inner.read_all().await
        }

        async fn append_row(&self, values: Vec<String>) -> Result<(), CoreError> {
            self.count();
            self.inner.append_row(values).await
        }

        async fn append_rows(&self, rows: Vec<Vec<String>>) -> Result<(), CoreError> {
            self.count();
            self.inner.append_rows(rows).await
        }

        async fn update_row(&self, row: u32, values: Vec<Option<String>>) -> Result<(), CoreError> {
            self.count();
            self.inner.update_row(row, values).await
        }

        async fn delete_row(&self, row: u32) -> Result<(), CoreError> {
            self.count();
            self.inner.delete_row(row).await
        }

        async fn insert_column(&self, column: usize) -> Result<(), CoreError> {
            self.count();
            self.inner.insert_column(column).await
        }
    }

    #[tokio::test]
    async fn batch_to_empty_sheet_is_one_write() {
        let sheet = CountingSheet::default();
        let current = RecordStore::new().load(&sheet).await.unwrap();
        let batch = vec![
            Record::sell("Alba", Category::Other, "Stick", 1),
            Record::buy("Brel", Category::Other, "Rope", 4),
        ];
        MutationService::new()
            .append_batch(&sheet, &current, &batch)
            .await
            .unwrap();

        assert_eq!(sheet.writes.load(Ordering::SeqCst), 1);
        let rows = sheet.inner.rows();
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0], HEADER.iter().map(|s| s.to_string()).collect::<Vec<_>>());
    }

    #[tokio::test]
    async fn append_to_empty_sheet_is_one_write() {
        let sheet = CountingSheet::default();
        let current = RecordStore::new().load(&sheet).await.unwrap();
        MutationService::new()
            .append(&sheet, &current, &Record::sell("Alba", Category::Other, "Stick", 1))
            .await
            .unwrap();
        assert_eq!(sheet.writes.load(Ordering::SeqCst), 1);
        assert_eq!(sheet.inner.row_count(), 2);
    }
}
