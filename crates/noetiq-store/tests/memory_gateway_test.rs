//! MemoryGateway used through the `StorageGateway` trait object.

use std::sync::Arc;
use std::time::Duration;

use noetiq_core::{Credential, NoteDocument, StorageGateway, VaultDraft};
use noetiq_store::{Command, GatewayCall, MemoryGateway};

#[tokio::test]
async fn test_trait_object_round_trip() {
    let memory = Arc::new(MemoryGateway::new());
    let gateway: Arc<dyn StorageGateway> = memory.clone();
    let cred = Credential::new("pw");

    gateway.set_password("pw", "h").await.unwrap();
    gateway
        .create_vault(&cred, &VaultDraft::new("📦", "Work", ""))
        .await
        .unwrap();
    let vault = gateway.list_vaults(&cred).await.unwrap()[0].id.clone();
    gateway.create_note(&cred, &vault, "🔥").await.unwrap();

    let index = gateway.get_notes_index(&cred, &vault).await.unwrap();
    assert_eq!(index.len(), 1);
    let data = gateway
        .get_note_data(&cred, &vault, &index[0].filename)
        .await
        .unwrap();
    assert_eq!(data, NoteDocument::default());

    assert_eq!(memory.count(Command::CreateNote).await, 1);
}

#[tokio::test]
async fn test_set_password_resets_catalog() {
    let gateway = MemoryGateway::with_password("pw", "");
    gateway.seed_vault(VaultDraft::new("📦", "Work", "")).await;

    gateway.set_password("fresh", "").await.unwrap();
    assert!(gateway
        .list_vaults(&Credential::new("fresh"))
        .await
        .unwrap()
        .is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_calls_are_journaled_at_issue_time() {
    let gateway = Arc::new(MemoryGateway::with_password("pw", ""));
    let vault = gateway.seed_vault(VaultDraft::new("📦", "Work", "")).await;
    let slow = gateway
        .seed_note(&vault, "slow", NoteDocument::default())
        .await
        .unwrap();
    let fast = gateway
        .seed_note(&vault, "fast", NoteDocument::default())
        .await
        .unwrap();
    gateway
        .set_note_latency(Command::GetNoteData, &slow, Duration::from_millis(500))
        .await;

    let pending = {
        let gateway = gateway.clone();
        let vault = vault.clone();
        let slow = slow.clone();
        tokio::spawn(async move {
            gateway
                .get_note_data(&Credential::new("pw"), &vault, &slow)
                .await
        })
    };
    tokio::time::sleep(Duration::from_millis(1)).await;
    gateway
        .get_note_data(&Credential::new("pw"), &vault, &fast)
        .await
        .unwrap();
    assert!(!pending.is_finished());
    pending.await.unwrap().unwrap();

    assert_eq!(
        gateway.calls().await,
        vec![
            GatewayCall::GetNoteData {
                vault: vault.clone(),
                note: slow
            },
            GatewayCall::GetNoteData { vault, note: fast },
        ]
    );
}
