#[path = "common/mod.rs"]
mod common;

use std::collections::{BTreeMap, HashSet};

use cobranca::{
    error::{EditError, StoreError},
    models::{AccountStatus, MonthStatus},
    state::{ClientEdit, NewClient},
};

use common::{client, read_raw, setup};

#[tokio::test]
async fn add_assigns_next_id_and_opens_every_month() {
    let ctx = setup(&[]).await;
    let book = &ctx.state.clients;

    let first = book
        .add_client(NewClient {
            name: "  Ana Souza ".into(),
            phone: "67999990000".into(),
            monthly_amount: "1500,5".into(),
        })
        .await
        .unwrap();
    let second = book
        .add_client(NewClient {
            name: "Bruno".into(),
            phone: String::new(),
            monthly_amount: "abc".into(),
        })
        .await
        .unwrap();
    assert_eq!((first, second), (1, 2));

    let ana = book.find(1).await.unwrap();
    assert_eq!(ana.name, "Ana Souza");
    assert_eq!(ana.monthly_amount, "1.500,50");
    assert_eq!(ana.status_by_month.len(), 12);
    assert!(ana.status_by_month.values().all(|s| *s == MonthStatus::Open));
    assert!(!ana.is_selected);

    let bruno = book.find(2).await.unwrap();
    assert_eq!(bruno.monthly_amount, "0,00");
    assert_eq!(bruno.pending_adjustment, "0,00");

    let raw = read_raw(&ctx.clients_file);
    assert!(raw.contains("\"nome_cliente\": \"Ana Souza\""));
    assert!(raw.contains("\"EM ABERTO\""));
}

#[tokio::test]
async fn ids_continue_after_the_highest_existing_one() {
    let ctx = setup(&[client(7, "Ana", "1", "10,00")]).await;
    let id = ctx
        .state
        .clients
        .add_client(NewClient {
            name: "Carla".into(),
            ..NewClient::default()
        })
        .await
        .unwrap();
    assert_eq!(id, 8);
}

#[tokio::test]
async fn add_without_name_is_rejected_before_writing() {
    let ctx = setup(&[]).await;
    let err = ctx
        .state
        .clients
        .add_client(NewClient {
            name: "   ".into(),
            phone: "1".into(),
            monthly_amount: "10".into(),
        })
        .await
        .unwrap_err();
    assert!(matches!(err, EditError::NameRequired));
    assert!(!ctx.clients_file.exists());
}

#[tokio::test]
async fn search_matches_name_or_phone_ignoring_case() {
    let ctx = setup(&[
        client(1, "Ana Souza", "6799990001", "10,00"),
        client(2, "Bruno Lima", "6733330002", "10,00"),
    ])
    .await;
    let book = &ctx.state.clients;

    let by_name: Vec<i64> = book.search("SOUZA").await.iter().map(|c| c.id).collect();
    assert_eq!(by_name, vec![1]);
    let by_phone: Vec<i64> = book.search("3333").await.iter().map(|c| c.id).collect();
    assert_eq!(by_phone, vec![2]);
    assert_eq!(book.search("  ").await.len(), 2);
    assert!(book.search("zzz").await.is_empty());
}

#[tokio::test]
async fn selection_never_includes_inactive_clients() {
    let mut inactive = client(3, "Carla", "3", "10,00");
    inactive.account_status = AccountStatus::Inactive;
    let ctx = setup(&[
        client(1, "Ana", "1", "10,00"),
        client(2, "Bruno", "2", "10,00"),
        inactive,
    ])
    .await;
    let book = &ctx.state.clients;

    let ids: HashSet<i64> = [1, 3].into_iter().collect();
    assert_eq!(book.save_selection(&ids).await.unwrap(), 1);

    let selected: Vec<i64> = book.list().await.iter().filter(|c| c.is_selected).map(|c| c.id).collect();
    assert_eq!(selected, vec![1]);
    let active: Vec<i64> = book.selected_active().await.iter().map(|c| c.id).collect();
    assert_eq!(active, vec![1]);
}

#[tokio::test]
async fn batch_paid_clears_partial_amount() {
    let mut ana = client(1, "Ana", "1", "100,00");
    ana.set_status("MARCO", MonthStatus::Partial);
    ana.partial_payments_by_month
        .insert("MARCO".into(), "30,00".into());
    let ctx = setup(&[ana]).await;
    let book = &ctx.state.clients;

    let changed = book.batch_update_status(&[1], "marco", "PAGO").await.unwrap();
    assert_eq!(changed, 1);

    let ana = book.find(1).await.unwrap();
    assert_eq!(ana.status_of("MARCO"), MonthStatus::Paid);
    assert!(ana.partial_paid("MARCO").is_none());
    assert!(ana.partial_payments_by_month.is_empty());
}

#[tokio::test]
async fn batch_only_touches_active_clients() {
    let mut inactive = client(2, "Bruno", "2", "10,00");
    inactive.account_status = AccountStatus::Inactive;
    let ctx = setup(&[client(1, "Ana", "1", "10,00"), inactive]).await;
    let book = &ctx.state.clients;

    let changed = book
        .batch_update_status(&[1, 2, 99], "JANEIRO", "PAGO")
        .await
        .unwrap();
    assert_eq!(changed, 1);
    assert_eq!(book.find(1).await.unwrap().status_of("JANEIRO"), MonthStatus::Paid);
    assert_eq!(book.find(2).await.unwrap().status_of("JANEIRO"), MonthStatus::Open);
}

#[tokio::test]
async fn invalid_batch_input_leaves_file_untouched() {
    let ctx = setup(&[client(1, "Ana", "1", "10,00")]).await;
    let book = &ctx.state.clients;
    let before = read_raw(&ctx.clients_file);

    let cases = [
        (vec![1], "", "PAGO"),
        (vec![1], "JANEIRO", ""),
        (vec![], "JANEIRO", "PAGO"),
        (vec![1], "JANUARY", "PAGO"),
        (vec![1], "JANEIRO", "QUITADO"),
    ];
    for (ids, month, status) in cases {
        let err = book.batch_update_status(&ids, month, status).await.unwrap_err();
        assert!(err.is_user_error(), "{err}");
    }
    assert_eq!(read_raw(&ctx.clients_file), before);
}

#[tokio::test]
async fn full_edit_updates_every_field() {
    let mut ana = client(1, "Ana", "1", "100,00");
    ana.pending_adjustment = "20,00".into();
    let ctx = setup(&[ana]).await;
    let book = &ctx.state.clients;

    let mut statuses = BTreeMap::new();
    statuses.insert("JANEIRO".to_string(), "PARCIAL".to_string());
    statuses.insert("FEVEREIRO".to_string(), "PAGO".to_string());
    let mut partial_paid = BTreeMap::new();
    partial_paid.insert("JANEIRO".to_string(), "40".to_string());
    // ignored: month is not partial
    partial_paid.insert("FEVEREIRO".to_string(), "10,00".to_string());

    book.update_client(
        1,
        ClientEdit {
            name: "Ana Maria".into(),
            phone: " 6799 ".into(),
            monthly_amount: Some("  ".into()),
            pending_adjustment: Some(String::new()),
            account_status: Some("INATIVO".into()),
            statuses,
            partial_paid,
        },
    )
    .await
    .unwrap();

    let ana = book.find(1).await.unwrap();
    assert_eq!(ana.name, "Ana Maria");
    assert_eq!(ana.phone, "6799");
    assert_eq!(ana.monthly_amount, "100,00");
    assert_eq!(ana.pending_adjustment, "0,00");
    assert_eq!(ana.account_status, AccountStatus::Inactive);
    assert!(!ana.is_selected);
    assert_eq!(ana.status_of("JANEIRO"), MonthStatus::Partial);
    assert_eq!(ana.partial_paid("JANEIRO"), Some("40,00"));
    assert_eq!(ana.status_of("FEVEREIRO"), MonthStatus::Paid);
    assert!(ana.partial_paid("FEVEREIRO").is_none());
    assert_eq!(ana.status_of("MARCO"), MonthStatus::Open);
}

#[tokio::test]
async fn full_edit_rejections() {
    let ctx = setup(&[client(1, "Ana", "1", "100,00")]).await;
    let book = &ctx.state.clients;
    let before = read_raw(&ctx.clients_file);

    let nameless = book
        .update_client(1, ClientEdit::default())
        .await
        .unwrap_err();
    assert!(matches!(nameless, EditError::NameRequired));

    let missing = book
        .update_client(
            42,
            ClientEdit {
                name: "X".into(),
                ..ClientEdit::default()
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(missing, EditError::ClientNotFound(42)));

    let mut statuses = BTreeMap::new();
    statuses.insert("SMARCH".to_string(), "PAGO".to_string());
    let unknown = book
        .update_client(
            1,
            ClientEdit {
                name: "Ana".into(),
                statuses,
                ..ClientEdit::default()
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(unknown, EditError::UnknownMonth(_)));

    assert_eq!(read_raw(&ctx.clients_file), before);
}

#[tokio::test]
async fn malformed_file_reads_as_empty() {
    let ctx = setup(&[]).await;
    std::fs::write(&ctx.clients_file, "{ not json").unwrap();
    assert!(ctx.state.clients.list().await.is_empty());
}

#[tokio::test]
async fn malformed_file_is_never_overwritten() {
    let ctx = setup(&[]).await;
    let broken = r#"[{"id": 1, "nome_cliente": "Ana"}, {"id": 2, "nome_cliente": "Bruno"},]"#;
    std::fs::write(&ctx.clients_file, broken).unwrap();
    let book = &ctx.state.clients;

    assert!(matches!(
        book.normalize().await,
        Err(StoreError::Malformed { .. })
    ));
    assert_eq!(read_raw(&ctx.clients_file), broken);

    let added = book
        .add_client(NewClient {
            name: "Carla".into(),
            phone: "333".into(),
            monthly_amount: "10,00".into(),
        })
        .await;
    assert!(matches!(added, Err(EditError::Store(_))));
    assert_eq!(read_raw(&ctx.clients_file), broken);

    assert!(book.save_selection(&HashSet::from([1])).await.is_err());
    assert_eq!(read_raw(&ctx.clients_file), broken);
    assert!(book.list().await.is_empty());
}

#[tokio::test]
async fn months_are_written_in_calendar_order() {
    let mut ana = client(1, "Ana", "111", "100,00");
    ana.set_status("ABRIL", MonthStatus::Partial);
    ana.set_status("FEVEREIRO", MonthStatus::Partial);
    ana.partial_payments_by_month
        .insert("ABRIL".into(), "10,00".into());
    ana.partial_payments_by_month
        .insert("FEVEREIRO".into(), "5,00".into());
    let ctx = setup(&[ana]).await;

    let raw = read_raw(&ctx.clients_file);
    let at = |key: &str| raw.find(&format!("\"{key}\"")).unwrap();
    assert!(at("JANEIRO") < at("FEVEREIRO"));
    assert!(at("FEVEREIRO") < at("MARCO"));
    assert!(at("MARCO") < at("ABRIL"));
    assert!(at("NOVEMBRO") < at("DEZEMBRO"));

    let partials = &raw[at("pagamentos_parciais")..];
    assert!(partials.find("FEVEREIRO").unwrap() < partials.find("ABRIL").unwrap());

    // still reads back the same
    let back = ctx.state.clients.find(1).await.unwrap();
    assert_eq!(back.status_of("ABRIL"), MonthStatus::Partial);
    assert_eq!(back.partial_paid("FEVEREIRO"), Some("5,00"));
}

#[tokio::test]
async fn normalize_repairs_old_records() {
    let ctx = setup(&[]).await;
    std::fs::write(
        &ctx.clients_file,
        r#"[{"id": 4, "nome_cliente": "Ana", "valor_mensalidade": 150, "status_meses": {"JANEIRO": "PAGO"}, "pagamentos_parciais": {"JANEIRO": "10,00"}, "selecao": true, "status_cliente": "INATIVO"}]"#,
    )
    .unwrap();

    ctx.state.clients.normalize().await.unwrap();

    let ana = ctx.state.clients.find(4).await.unwrap();
    assert_eq!(ana.monthly_amount, "150,00");
    assert_eq!(ana.status_by_month.len(), 12);
    assert_eq!(ana.status_of("JANEIRO"), MonthStatus::Paid);
    assert!(ana.partial_payments_by_month.is_empty());
    assert!(!ana.is_selected);
    assert!(read_raw(&ctx.clients_file).contains("\"pendencia\": \"0,00\""));
}
