// receipt.rs
// Receipt PDFs: typst source rendered by the `typst` binary, with a PIX QR code.

use std::{
    fmt::Write as _,
    io::Cursor,
    path::{Path, PathBuf},
    process::Stdio,
};

use async_trait::async_trait;
use chrono::NaiveDate;
use image::{ImageFormat, Luma};
use qrcode::QrCode;
use rand::{Rng, distr::Alphanumeric};
use slug::slugify;
use tokio::{fs, process::Command};

use crate::{
    config::{AppConfig, IssuerConfig},
    error::DocumentError,
    money::{self, CURRENCY_PREFIX},
    words::amount_in_words,
};

/// What goes on one receipt.
#[derive(Debug, Clone)]
pub struct Receipt {
    pub client_name: String,
    /// Already formatted amount, e.g. "150,00".
    pub amount_text: String,
    /// "DEZEMBRO de 2025".
    pub period_label: String,
    pub issued_on: NaiveDate,
}

#[async_trait]
pub trait ReceiptGenerator: Send + Sync {
    async fn generate(&self, receipt: &Receipt) -> Result<PathBuf, DocumentError>;
}

/// File name used for a client's receipt inside the receipts directory.
pub fn receipt_file_name(client_name: &str) -> String {
    let slug = slugify(client_name);
    if slug.is_empty() {
        "recibo_cliente.pdf".to_string()
    } else {
        format!("recibo_{}.pdf", slug.replace('-', "_"))
    }
}

/// Images available next to the typst source, by file name.
#[derive(Debug, Default, Clone)]
pub struct ReceiptAssets {
    pub header: Option<String>,
    pub qr_code: Option<String>,
    pub signature: Option<String>,
}

fn typst_str(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('"');
    for ch in value.chars() {
        match ch {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            _ => out.push(ch),
        }
    }
    out.push('"');
    out
}

/// Typst markup for one receipt. Every user-provided value is embedded as a string literal.
pub fn receipt_source(receipt: &Receipt, issuer: &IssuerConfig, assets: &ReceiptAssets) -> String {
    let amount = money::parse(Some(&receipt.amount_text)).or_zero();
    let valor = format!(
        "{} {} ({})",
        CURRENCY_PREFIX,
        receipt.amount_text,
        amount_in_words(amount)
    );

    let mut src = String::new();
    src.push_str("#set page(paper: \"a4\", margin: (x: 2cm, y: 1.5cm))\n");
    src.push_str("#set text(size: 12pt, lang: \"pt\")\n\n");

    if let Some(header) = &assets.header {
        let _ = writeln!(src, "#align(center)[#image({}, width: 100mm)]", typst_str(header));
    }
    src.push_str("#v(2cm)\n\n");

    let _ = writeln!(
        src,
        "Recebemos de #strong({}), a importância abaixo discriminada:\n",
        typst_str(&receipt.client_name)
    );
    let _ = writeln!(src, "Valor: #strong({})\n", typst_str(&valor));
    let _ = writeln!(
        src,
        "Referente à mensalidade do mês de #{}.\n",
        typst_str(&receipt.period_label)
    );
    src.push_str("#v(1.5cm)\n");

    if let Some(qr) = &assets.qr_code {
        let _ = writeln!(src, "#align(center)[#image({}, width: 60mm)]", typst_str(qr));
        src.push_str("#v(0.8cm)\n");
    }

    let place_and_date = if issuer.city.is_empty() {
        receipt.issued_on.format("%d/%m/%Y").to_string()
    } else {
        format!("{}, {}", issuer.city, receipt.issued_on.format("%d/%m/%Y"))
    };
    let _ = writeln!(src, "#align(center)[#{}]", typst_str(&place_and_date));
    src.push_str("#v(0.8cm)\n");

    if let Some(signature) = &assets.signature {
        let _ = writeln!(
            src,
            "#align(center)[#image({}, width: 30mm)]",
            typst_str(signature)
        );
    }

    src.push_str("#align(center)[\n  #line(length: 9cm)\n");
    let _ = writeln!(src, "  #strong({}) \\", typst_str(&issuer.name));
    if !issuer.document.is_empty() {
        let _ = writeln!(src, "  #{} \\", typst_str(&format!("CPF: {}", issuer.document)));
    }
    if !issuer.registration.is_empty() {
        let _ = writeln!(src, "  #{}", typst_str(&format!("CRC: {}", issuer.registration)));
    }
    src.push_str("]\n");
    src
}

/// PNG of a QR code carrying the PIX key.
pub fn pix_qr_png(pix_key: &str) -> Result<Vec<u8>, DocumentError> {
    let code = QrCode::new(pix_key.as_bytes()).map_err(|e| DocumentError::QrCode(e.to_string()))?;
    let img = code.render::<Luma<u8>>().min_dimensions(300, 300).build();

    // image 0.25: write_to requires Write + Seek -> Cursor<Vec<u8>>
    let mut cursor = Cursor::new(Vec::<u8>::new());
    image::DynamicImage::ImageLuma8(img)
        .write_to(&mut cursor, ImageFormat::Png)
        .map_err(|e| DocumentError::QrCode(e.to_string()))?;
    Ok(cursor.into_inner())
}

/// Fresh `typst-<suffix>` directory under the system temp dir.
async fn scratch_dir() -> Result<PathBuf, DocumentError> {
    let suffix: String = rand::rng()
        .sample_iter(&Alphanumeric)
        .take(12)
        .map(char::from)
        .collect();
    let dir = std::env::temp_dir().join(format!("typst-{}", suffix));
    fs::create_dir(&dir).await?;
    Ok(dir)
}

pub struct TypstReceipts {
    typst_bin: String,
    output_dir: PathBuf,
    issuer: IssuerConfig,
    pix_key: String,
}

impl TypstReceipts {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            typst_bin: config.typst_bin.clone(),
            output_dir: config.receipts_dir.clone(),
            issuer: config.issuer.clone(),
            pix_key: config.billing.pix_key.clone(),
        }
    }

    // Copies an optional image into the scratch dir; a missing file is only logged.
    async fn stage_image(
        &self,
        scratch: &Path,
        source: Option<&PathBuf>,
        stem: &str,
    ) -> Option<String> {
        let source = source?;
        let ext = source
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("png");
        let name = format!("{stem}.{ext}");
        match fs::copy(source, scratch.join(&name)).await {
            Ok(_) => Some(name),
            Err(err) => {
                tracing::warn!(path = %source.display(), error = %err, "receipt image unavailable");
                None
            }
        }
    }
}

#[async_trait]
impl ReceiptGenerator for TypstReceipts {
    async fn generate(&self, receipt: &Receipt) -> Result<PathBuf, DocumentError> {
        let scratch = scratch_dir().await?;
        let result = self.render_in(&scratch, receipt).await;
        if let Err(err) = fs::remove_dir_all(&scratch).await {
            tracing::warn!(path = %scratch.display(), error = %err, "scratch dir not removed");
        }
        let final_path = result?;
        tracing::info!(path = %final_path.display(), "receipt generated");
        Ok(final_path)
    }
}

impl TypstReceipts {
    // Everything that happens inside the scratch dir; cleanup is left to the caller.
    async fn render_in(&self, scratch: &Path, receipt: &Receipt) -> Result<PathBuf, DocumentError> {
        let mut assets = ReceiptAssets {
            header: self
                .stage_image(scratch, self.issuer.header_image.as_ref(), "header")
                .await,
            signature: self
                .stage_image(scratch, self.issuer.signature_image.as_ref(), "signature")
                .await,
            qr_code: None,
        };
        if !self.pix_key.trim().is_empty() {
            let png = pix_qr_png(self.pix_key.trim())?;
            fs::write(scratch.join("pix.png"), png).await?;
            assets.qr_code = Some("pix.png".into());
        }

        let input_path = scratch.join("input.typ");
        let output_path = scratch.join("output.pdf");
        fs::write(&input_path, receipt_source(receipt, &self.issuer, &assets)).await?;

        let output = Command::new(&self.typst_bin)
            .arg("compile")
            .arg("--root")
            .arg(scratch)
            .arg(&input_path)
            .arg(&output_path)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|err| {
                if err.kind() == std::io::ErrorKind::NotFound {
                    DocumentError::RendererMissing(self.typst_bin.clone())
                } else {
                    DocumentError::Io(err)
                }
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            return Err(DocumentError::Render(if stderr.is_empty() {
                "typst exited with an error".to_string()
            } else {
                stderr
            }));
        }

        fs::create_dir_all(&self.output_dir).await?;
        let final_path = self.output_dir.join(receipt_file_name(&receipt.client_name));
        fs::copy(&output_path, &final_path).await?;
        Ok(final_path)
    }
}
