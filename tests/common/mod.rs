#![allow(dead_code)]

use std::{
    path::{Path, PathBuf},
    sync::{Arc, Mutex},
};

use async_trait::async_trait;
use tempfile::TempDir;

use cobranca::{
    config::{AppConfig, BillingConfig, IssuerConfig, MessagingConfig, StorageConfig},
    error::{DispatchError, DocumentError},
    messaging::Messenger,
    models::{ClientRecord, MonthStatus},
    receipt::{Receipt, ReceiptGenerator, receipt_file_name},
    state::{AppState, ClientStore, JsonFileStore},
};

/// One message handed to the fake messenger.
#[derive(Debug, Clone)]
pub struct SentMessage {
    pub phone: String,
    pub text: String,
    pub attachment: Option<PathBuf>,
}

/// Records every message; numbers listed in `failing` get a rejection.
#[derive(Default)]
pub struct FakeMessenger {
    pub sent: Mutex<Vec<SentMessage>>,
    pub failing: Vec<String>,
}

impl FakeMessenger {
    pub fn failing_for(phones: &[&str]) -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
            failing: phones.iter().map(|p| p.to_string()).collect(),
        }
    }

    pub fn messages(&self) -> Vec<SentMessage> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl Messenger for FakeMessenger {
    async fn send(
        &self,
        phone: &str,
        text: &str,
        attachment: Option<&Path>,
    ) -> Result<(), DispatchError> {
        if self.failing.iter().any(|p| p == phone) {
            return Err(DispatchError::Rejected {
                status: 500,
                body: "boom".into(),
            });
        }
        self.sent.lock().unwrap().push(SentMessage {
            phone: phone.to_string(),
            text: text.to_string(),
            attachment: attachment.map(Path::to_path_buf),
        });
        Ok(())
    }
}

/// Writes a placeholder file per receipt, or fails every time.
pub struct FakeReceipts {
    pub dir: PathBuf,
    pub fail: bool,
    pub generated: Mutex<Vec<Receipt>>,
}

impl FakeReceipts {
    pub fn new(dir: &Path) -> Self {
        Self {
            dir: dir.to_path_buf(),
            fail: false,
            generated: Mutex::new(Vec::new()),
        }
    }

    pub fn broken(dir: &Path) -> Self {
        Self {
            fail: true,
            ..Self::new(dir)
        }
    }

    pub fn receipts(&self) -> Vec<Receipt> {
        self.generated.lock().unwrap().clone()
    }
}

#[async_trait]
impl ReceiptGenerator for FakeReceipts {
    async fn generate(&self, receipt: &Receipt) -> Result<PathBuf, DocumentError> {
        if self.fail {
            return Err(DocumentError::RendererMissing("typst".into()));
        }
        let path = self.dir.join(receipt_file_name(&receipt.client_name));
        tokio::fs::write(&path, b"%PDF-1.7 fake").await?;
        self.generated.lock().unwrap().push(receipt.clone());
        Ok(path)
    }
}

pub struct TestContext {
    pub state: Arc<AppState>,
    pub messenger: Arc<FakeMessenger>,
    pub receipts: Arc<FakeReceipts>,
    pub clients_file: PathBuf,
    _dir: TempDir,
}

pub fn test_config(dir: &Path) -> AppConfig {
    AppConfig {
        port: 0,
        clients_file: dir.join("base_clientes.json"),
        receipts_dir: dir.join("recibos"),
        typst_bin: "typst".into(),
        billing: BillingConfig {
            pix_key: "chave-pix".into(),
            ..BillingConfig::default()
        },
        issuer: IssuerConfig::default(),
        messaging: MessagingConfig {
            token: None,
            text_url: String::new(),
            media_url: String::new(),
        },
        storage: StorageConfig {
            url: None,
            key: None,
            bucket: "recibos".into(),
        },
    }
}

pub struct Setup {
    pub billing: BillingConfig,
    pub messenger: FakeMessenger,
    pub broken_receipts: bool,
}

impl Default for Setup {
    fn default() -> Self {
        Self {
            billing: BillingConfig {
                pix_key: "chave-pix".into(),
                ..BillingConfig::default()
            },
            messenger: FakeMessenger::default(),
            broken_receipts: false,
        }
    }
}

/// Fresh temp directory, clients file seeded with `clients` (skipped when empty).
pub async fn setup_with(clients: &[ClientRecord], setup: Setup) -> TestContext {
    let dir = tempfile::tempdir().expect("tempdir");
    let mut config = test_config(dir.path());
    config.billing = setup.billing;
    std::fs::create_dir_all(&config.receipts_dir).expect("receipts dir");

    let clients_file = config.clients_file.clone();
    let store = Arc::new(JsonFileStore::new(
        clients_file.clone(),
        config.billing.months.clone(),
    ));
    if !clients.is_empty() {
        store.save(clients).await.expect("seed clients");
    }

    let receipts = Arc::new(if setup.broken_receipts {
        FakeReceipts::broken(&config.receipts_dir)
    } else {
        FakeReceipts::new(&config.receipts_dir)
    });
    let messenger = Arc::new(setup.messenger);
    let state = Arc::new(AppState::new(
        config,
        store,
        receipts.clone(),
        messenger.clone(),
    ));

    TestContext {
        state,
        messenger,
        receipts,
        clients_file,
        _dir: dir,
    }
}

pub async fn setup(clients: &[ClientRecord]) -> TestContext {
    setup_with(clients, Setup::default()).await
}

/// Active, selected client with every month open.
pub fn client(id: i64, name: &str, phone: &str, monthly: &str) -> ClientRecord {
    let mut c = ClientRecord {
        id,
        name: name.into(),
        phone: phone.into(),
        monthly_amount: monthly.into(),
        is_selected: true,
        ..ClientRecord::default()
    };
    for month in cobranca::calendar::MonthNames::default().names() {
        c.set_status(&month, MonthStatus::Open);
    }
    c
}

/// Same client with every month paid.
pub fn paid_up(mut c: ClientRecord) -> ClientRecord {
    for month in cobranca::calendar::MonthNames::default().names() {
        c.set_status(&month, MonthStatus::Paid);
    }
    c
}

pub fn read_raw(path: &Path) -> String {
    std::fs::read_to_string(path).unwrap_or_default()
}
