use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Status value the backend uses for published news items
const STATUS_PUBLICADO: &str = "publicado";

/// News item from `GET /noticias/`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Noticia {
    pub id: i64,
    pub titulo: String,
    #[serde(default)]
    pub resumo: String,
    #[serde(default)]
    pub conteudo: Option<String>,
    #[serde(default)]
    pub imagem: Option<String>,
    pub status: String,
    pub data_criacao: DateTime<Utc>,
}

impl Noticia {
    pub fn is_published(&self) -> bool {
        self.status == STATUS_PUBLICADO
    }
}

/// Transparency document from `GET /transparencia/`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Documento {
    pub id: i64,
    pub titulo_documento: String,
    pub categoria: String,
    #[serde(default)]
    pub arquivo_pdf: Option<String>,
    #[serde(default)]
    pub data_documento_formatada: Option<String>,
    pub data_criacao: DateTime<Utc>,
}
