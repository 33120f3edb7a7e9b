// src/vendas/vendas_structs.rs

use bigdecimal::BigDecimal;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Estrutura para representar um item individual dentro de uma venda.
/// A venda recebe um array desses itens no corpo da requisição.
#[derive(Deserialize, Serialize, Clone)]
pub struct ItemVenda {
    pub codigo: String,
    pub quantidade: i32,
}

/// Linha do produto que o motor de vendas lê (e bloqueia) durante a venda.
#[derive(Clone, FromRow)]
pub struct ProdutoEstoque {
    pub codigo: String,
    pub nome: String,
    pub preco: BigDecimal,
    pub quantidade: i32,
}

/// Registro de venda persistido: um por item aplicado com sucesso.
/// Nome e preço são cópias do produto no momento da venda.
#[derive(Clone, Serialize)]
pub struct RegistroVenda {
    pub codigo: String,
    pub nome: String,
    pub preco: BigDecimal,
    pub quantidade: i32,
    pub data_venda: DateTime<Utc>,
}

/// Resultado de uma venda confirmada.
/// Contém o valor total da compra e quantos registros foram gravados.
#[derive(Debug, Serialize)]
pub struct VendaConcluida {
    pub total_compra: BigDecimal,
    pub itens_registrados: usize,
}

/// Linha do relatório de vendas: registros confirmados unidos ao nome
/// atual do produto.
#[derive(Clone, Serialize, FromRow)]
pub struct LinhaRelatorio {
    pub codigo: String,
    pub nome: String,
    pub quantidade: i32,
    pub preco: BigDecimal,
    pub data_venda: DateTime<Utc>,
}

/// Intervalo de datas opcional do relatório (query string).
/// O filtro só é aplicado quando as duas datas são informadas.
#[derive(Deserialize)]
pub struct FiltroRelatorio {
    pub data_inicio: Option<NaiveDate>,
    pub data_fim: Option<NaiveDate>,
}
