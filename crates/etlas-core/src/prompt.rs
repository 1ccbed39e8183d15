//! System instruction builder for the ETL assistant.
//!
//! The instruction document is a versioned JSON file (or the built-in
//! default) rendered into one markdown-ish text block. Rendering walks the
//! document in a fixed order, so the same document always yields
//! byte-identical text.
//!
//! Layout:
//! ```text
//! # {ROLE}
//! {description}
//!
//! ## Capacidades
//! ## Directrices para Análisis de Esquemas
//! ## Directrices para Generación de Código
//! ## Formato de Respuestas
//! ## Restricciones
//! ## Herramientas ETL Soportadas
//! ```

use std::fmt::Write as _;
use std::path::Path;

use etlas_types::error::PromptError;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Header placed between the rendered instructions and a schema description.
pub const SCHEMA_HEADER: &str = "\n\nEsquema de base de datos:\n";

/// Suffix added to the first user turn of a chat so the reply names the chat.
pub const TITLE_REQUEST: &str = "\nAl formato de respuesta agrega el campo 'title', cuyo valor sera una frase muy corta que defina el contexto de la conversacion.";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromptTemplate {
    #[serde(default = "default_version")]
    pub version: String,
    pub role: String,
    pub description: String,
    pub capabilities: Vec<String>,
    pub guidelines: Guidelines,
    pub response_format: ResponseFormat,
    pub constraints: Vec<String>,
    pub etl_tools: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Guidelines {
    pub schema_analysis: Vec<String>,
    pub code_generation: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseFormat {
    pub description: String,
    pub keys: Vec<ResponseKey>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseKey {
    pub key: String,
    pub value: String,
}

fn default_version() -> String {
    "1".to_string()
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|item| item.to_string()).collect()
}

impl Default for PromptTemplate {
    fn default() -> Self {
        Self {
            version: default_version(),
            role: "etl_assistant".to_string(),
            description:
                "Asistente especializado en ETL (Extract, Transform, Load) para bases de datos"
                    .to_string(),
            capabilities: strings(&[
                "Analizar esquemas de bases de datos",
                "Diseñar flujos ETL eficientes",
                "Generar código SQL, Python o herramientas ETL específicas",
                "Optimizar procesos de carga y transformación",
                "Resolver problemas comunes en ETL",
            ]),
            guidelines: Guidelines {
                schema_analysis: strings(&[
                    "Identifica tablas principales y sus relaciones",
                    "Detecta tablas de hechos y dimensiones si aplica",
                    "Analiza tipos de datos y posibles transformaciones necesarias",
                    "Considera la integridad referencial",
                    "Identifica campos clave para uniones y agregaciones",
                ]),
                code_generation: strings(&[
                    "Prioriza optimización de rendimiento y recursos",
                    "Incluye manejo de errores y validación de datos",
                    "Considera volúmenes de datos y escalabilidad",
                    "Documenta cada paso del proceso ETL",
                    "Genera código limpio, mantenible y bien comentado",
                    "El proceso ETL puede ser en SQL, Python o herramientas ETL como Airflow, Talend, etc.",
                    "El codigo debe tener solo al inicio un tag que indique el lenguaje de programación, por ejemplo: %sql%, %python%, etc.",
                ]),
            },
            response_format: ResponseFormat {
                description: "Estructura tus respuestas en un json_string con analysis, comment, code; en caso se requiera, genera un campo adicional title".to_string(),
                keys: vec![
                    ResponseKey::new("analysis", "Comprensión del problema o esquema"),
                    ResponseKey::new("comment", "Comentarios sobre la resolución propuesta"),
                    ResponseKey::new("code", "Implementación en SQL/Python/etc. "),
                    ResponseKey::new("title", "Título opcional sobre la conversación presente"),
                ],
            },
            constraints: strings(&[
                "No asumas información que no esté en el esquema o la solicitud",
                "Si falta información crítica, haz preguntas específicas",
                "Sigue las mejores prácticas según el motor de base de datos mencionado",
                "Considera siempre la seguridad y la calidad de los datos",
                "No generes código que pueda causar pérdida de datos o corrupción",
                "No generes código que no sea seguro o que pueda causar problemas de rendimiento",
                "No generes código que escriba o elimine datos del sistema de archivos",
            ]),
            etl_tools: strings(&[
                "SQL",
                "Python",
                "Airflow",
                "Talend",
                "SSIS",
                "Informatica",
                "dbt",
                "Spark",
                "AWS Glue",
                "Azure Data Factory",
            ]),
        }
    }
}

impl ResponseKey {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

impl PromptTemplate {
    /// Load the instruction document.
    ///
    /// With no path, or a path that does not exist, the built-in default is
    /// used. A file that exists but cannot be read or parsed is an error.
    pub fn load(path: Option<&Path>) -> Result<Self, PromptError> {
        let Some(path) = path else {
            return Ok(Self::default());
        };

        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                warn!(
                    "Prompt template {} not found, using built-in default",
                    path.display()
                );
                return Ok(Self::default());
            }
            Err(err) => {
                return Err(PromptError::Unreadable {
                    path: path.display().to_string(),
                    reason: err.to_string(),
                });
            }
        };

        let template: Self =
            serde_json::from_str(&content).map_err(|err| PromptError::Invalid {
                path: path.display().to_string(),
                reason: err.to_string(),
            })?;
        debug!(path = %path.display(), version = %template.version, "loaded prompt template");
        Ok(template)
    }

    /// Render the document into the system instruction text.
    pub fn render(&self) -> String {
        let mut text = String::new();

        let _ = writeln!(text, "# {}", self.role.to_uppercase());
        let _ = writeln!(text, "{}\n", self.description);

        push_list(&mut text, "Capacidades", &self.capabilities);
        push_list(
            &mut text,
            "Directrices para Análisis de Esquemas",
            &self.guidelines.schema_analysis,
        );
        push_list(
            &mut text,
            "Directrices para Generación de Código",
            &self.guidelines.code_generation,
        );

        text.push_str("## Formato de Respuestas\n");
        let _ = writeln!(text, "{}", self.response_format.description);
        for key in &self.response_format.keys {
            let _ = writeln!(text, "- **{}**: {}", key.key, key.value);
        }
        text.push('\n');

        push_list(&mut text, "Restricciones", &self.constraints);

        text.push_str("## Herramientas ETL Soportadas\n");
        text.push_str(&self.etl_tools.join(", "));
        text.push('\n');

        text
    }

    /// Render, then append `schema` verbatim after the instructions.
    pub fn render_with_schema(&self, schema: Option<&str>) -> String {
        let mut text = self.render();
        if let Some(schema) = schema.filter(|schema| !schema.is_empty()) {
            text.push_str(SCHEMA_HEADER);
            text.push_str(schema);
        }
        text
    }
}

fn push_list(text: &mut String, header: &str, items: &[String]) {
    let _ = writeln!(text, "## {header}");
    for item in items {
        let _ = writeln!(text, "- {item}");
    }
    text.push('\n');
}
