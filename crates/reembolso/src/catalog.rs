//! Static document-requirement catalog.
//!
//! Maps every attendance type to the document kinds the insurer demands for
//! it. Both enums are closed: unknown codes are rejected at the string
//! boundary (`FromStr`/serde) instead of silently resolving to an empty
//! requirement set, so a miscatalogued type can never masquerade as fully
//! documented.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Category of medical service driving the document requirements.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttendanceType {
    Consulta,
    ConsultaOnline,
    Psicologia,
    Fisioterapia,
    TerapiaOcupacional,
    Fonoaudiologia,
    Nutricao,
    Exame,
}

impl AttendanceType {
    pub const fn ordered() -> [Self; 8] {
        [
            Self::Consulta,
            Self::ConsultaOnline,
            Self::Psicologia,
            Self::Fisioterapia,
            Self::TerapiaOcupacional,
            Self::Fonoaudiologia,
            Self::Nutricao,
            Self::Exame,
        ]
    }

    pub const fn code(self) -> &'static str {
        match self {
            Self::Consulta => "consulta",
            Self::ConsultaOnline => "consulta_online",
            Self::Psicologia => "psicologia",
            Self::Fisioterapia => "fisioterapia",
            Self::TerapiaOcupacional => "terapia_ocupacional",
            Self::Fonoaudiologia => "fonoaudiologia",
            Self::Nutricao => "nutricao",
            Self::Exame => "exame",
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Consulta => "Consulta",
            Self::ConsultaOnline => "Consulta Online",
            Self::Psicologia => "Psicologia",
            Self::Fisioterapia => "Fisioterapia",
            Self::TerapiaOcupacional => "Terapia Ocupacional",
            Self::Fonoaudiologia => "Fonoaudiologia",
            Self::Nutricao => "Nutrição",
            Self::Exame => "Exame",
        }
    }
}

impl fmt::Display for AttendanceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for AttendanceType {
    type Err = CatalogError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        AttendanceType::ordered()
            .into_iter()
            .find(|candidate| candidate.code() == value)
            .ok_or_else(|| CatalogError::UnknownAttendanceType(value.to_string()))
    }
}

/// Kind of supporting document recognized by the catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentKind {
    NotaFiscal,
    ComprovantePagamento,
    EncaminhamentoMedico,
    RelatorioTerapeuta,
    PedidoMedico,
    DocumentoPessoal,
    CartaResultado,
    ContratoMedico,
}

impl DocumentKind {
    pub const fn ordered() -> [Self; 8] {
        [
            Self::NotaFiscal,
            Self::ComprovantePagamento,
            Self::EncaminhamentoMedico,
            Self::RelatorioTerapeuta,
            Self::PedidoMedico,
            Self::DocumentoPessoal,
            Self::CartaResultado,
            Self::ContratoMedico,
        ]
    }

    pub const fn code(self) -> &'static str {
        match self {
            Self::NotaFiscal => "nota_fiscal",
            Self::ComprovantePagamento => "comprovante_pagamento",
            Self::EncaminhamentoMedico => "encaminhamento_medico",
            Self::RelatorioTerapeuta => "relatorio_terapeuta",
            Self::PedidoMedico => "pedido_medico",
            Self::DocumentoPessoal => "documento_pessoal",
            Self::CartaResultado => "carta_resultado",
            Self::ContratoMedico => "contrato_medico",
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::NotaFiscal => "Nota Fiscal",
            Self::ComprovantePagamento => "Comprovante de Pagamento",
            Self::EncaminhamentoMedico => "Encaminhamento Médico",
            Self::RelatorioTerapeuta => "Relatório do Terapeuta",
            Self::PedidoMedico => "Pedido Médico",
            Self::DocumentoPessoal => "Documento Pessoal",
            Self::CartaResultado => "Carta Resultado da Seguradora",
            Self::ContratoMedico => "Contrato com Médico/Clínica",
        }
    }
}

impl fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for DocumentKind {
    type Err = CatalogError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        DocumentKind::ordered()
            .into_iter()
            .find(|candidate| candidate.code() == value)
            .ok_or_else(|| CatalogError::UnknownDocumentKind(value.to_string()))
    }
}

/// Catalog miss raised when a string code names no known entry.
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("unknown attendance type '{0}'")]
    UnknownAttendanceType(String),
    #[error("unknown document kind '{0}'")]
    UnknownDocumentKind(String),
}

impl CatalogError {
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::UnknownAttendanceType(_) => "unknown_attendance_type",
            Self::UnknownDocumentKind(_) => "unknown_document_kind",
        }
    }
}

const CONSULTATION_KINDS: &[DocumentKind] =
    &[DocumentKind::NotaFiscal, DocumentKind::ComprovantePagamento];

const THERAPY_KINDS: &[DocumentKind] = &[
    DocumentKind::NotaFiscal,
    DocumentKind::ComprovantePagamento,
    DocumentKind::EncaminhamentoMedico,
    DocumentKind::RelatorioTerapeuta,
];

const NUTRITION_KINDS: &[DocumentKind] = &[
    DocumentKind::NotaFiscal,
    DocumentKind::ComprovantePagamento,
    DocumentKind::EncaminhamentoMedico,
];

const EXAM_KINDS: &[DocumentKind] = &[
    DocumentKind::NotaFiscal,
    DocumentKind::ComprovantePagamento,
    DocumentKind::PedidoMedico,
];

/// Ordered set of kinds the insurer requires for the given attendance type.
pub const fn required_kinds(attendance_type: AttendanceType) -> &'static [DocumentKind] {
    match attendance_type {
        AttendanceType::Consulta | AttendanceType::ConsultaOnline => CONSULTATION_KINDS,
        AttendanceType::Psicologia
        | AttendanceType::Fisioterapia
        | AttendanceType::TerapiaOcupacional
        | AttendanceType::Fonoaudiologia => THERAPY_KINDS,
        AttendanceType::Nutricao => NUTRITION_KINDS,
        AttendanceType::Exame => EXAM_KINDS,
    }
}

/// Kinds a user may attach to any request without the catalog demanding them.
pub const fn optional_kinds() -> &'static [DocumentKind] {
    &[
        DocumentKind::DocumentoPessoal,
        DocumentKind::CartaResultado,
        DocumentKind::ContratoMedico,
    ]
}

/// Whether a kind is inherently reusable across requests without re-upload.
pub const fn is_recurring(kind: DocumentKind) -> bool {
    matches!(
        kind,
        DocumentKind::EncaminhamentoMedico | DocumentKind::ContratoMedico
    )
}

pub fn is_optional(kind: DocumentKind) -> bool {
    optional_kinds().contains(&kind)
}

/// Catalog entry exposed by the attendance-type listing endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct AttendanceTypeEntry {
    pub id: &'static str,
    pub name: &'static str,
    pub documents: Vec<&'static str>,
}

pub fn attendance_catalog() -> Vec<AttendanceTypeEntry> {
    AttendanceType::ordered()
        .into_iter()
        .map(|attendance_type| AttendanceTypeEntry {
            id: attendance_type.code(),
            name: attendance_type.label(),
            documents: required_kinds(attendance_type)
                .iter()
                .map(|kind| kind.code())
                .collect(),
        })
        .collect()
}

/// Catalog entry exposed by the document-kind listing endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct DocumentKindEntry {
    pub id: &'static str,
    pub name: &'static str,
    pub required_for: Vec<&'static str>,
    pub optional: bool,
    pub recurrent: bool,
}

pub fn document_catalog() -> Vec<DocumentKindEntry> {
    DocumentKind::ordered()
        .into_iter()
        .map(|kind| DocumentKindEntry {
            id: kind.code(),
            name: kind.label(),
            required_for: AttendanceType::ordered()
                .into_iter()
                .filter(|attendance_type| required_kinds(*attendance_type).contains(&kind))
                .map(|attendance_type| attendance_type.code())
                .collect(),
            optional: is_optional(kind),
            recurrent: is_recurring(kind),
        })
        .collect()
}
