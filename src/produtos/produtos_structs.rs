// src/produtos/produtos_structs.rs

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use bigdecimal::BigDecimal;

/// Estrutura que representa um produto no banco de dados.
/// O código é a chave única do produto; a quantidade em estoque nunca fica negativa.
/// Deriva FromRow para mapeamento direto de resultados de query SQL
#[derive(Serialize, FromRow)]
pub struct Produto {
    pub codigo: String,
    pub lote: String,
    pub nome: String,
    pub descricao: String,
    pub preco: BigDecimal,
    pub quantidade: i32,
    pub peso: BigDecimal,
    pub volume: BigDecimal,
}

/// Estrutura para receber dados do novo produto na requisição POST
#[derive(Deserialize)]
pub struct NovoProduto {
    pub codigo: String,
    pub lote: String,
    pub nome: String,
    pub descricao: String,
    pub preco: BigDecimal,
    pub quantidade: i32,
    pub peso: BigDecimal,
    pub volume: BigDecimal,
}

/// O cadastro aceita um único produto ou um array de produtos no mesmo endpoint.
#[derive(Deserialize)]
#[serde(untagged)]
pub enum CadastroProdutos {
    Um(NovoProduto),
    Varios(Vec<NovoProduto>),
}

impl CadastroProdutos {
    pub fn em_lista(self) -> Vec<NovoProduto> {
        match self {
            CadastroProdutos::Um(produto) => vec![produto],
            CadastroProdutos::Varios(produtos) => produtos,
        }
    }
}

/// Estrutura para atualização parcial de um produto.
/// Apenas os campos presentes na requisição são alterados.
#[derive(Deserialize)]
pub struct AtualizaProduto {
    pub lote: Option<String>,
    pub nome: Option<String>,
    pub descricao: Option<String>,
    pub preco: Option<BigDecimal>,
    pub quantidade: Option<i32>,
    pub peso: Option<BigDecimal>,
    pub volume: Option<BigDecimal>,
}

impl AtualizaProduto {
    /// Verifica se a requisição não trouxe nenhum campo para atualizar.
    pub fn vazia(&self) -> bool {
        self.lote.is_none()
            && self.nome.is_none()
            && self.descricao.is_none()
            && self.preco.is_none()
            && self.quantidade.is_none()
            && self.peso.is_none()
            && self.volume.is_none()
    }
}

/// Filtro opcional por código na listagem de produtos (query string).
#[derive(Deserialize)]
pub struct FiltroProduto {
    pub codigo: Option<String>,
}
