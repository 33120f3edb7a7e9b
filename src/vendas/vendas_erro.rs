// src/vendas/vendas_erro.rs

use thiserror::Error;

/// Erros do processamento de uma venda.
///
/// Qualquer erro aborta a venda inteira: nenhuma alteração de estoque e
/// nenhum registro de venda fica visível. `TempoEsgotado` e `Armazenamento`
/// podem ser reenviados pelo chamador.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum VendaErro {
    /// Requisição malformada: venda vazia ou quantidade não positiva.
    /// Rejeitada antes de qualquer acesso ao armazenamento.
    #[error("Requisição de venda inválida: {0}")]
    RequisicaoInvalida(String),

    /// O código informado não corresponde a nenhum produto.
    #[error("Produto com código {0} não encontrado para venda.")]
    ProdutoNaoEncontrado(String),

    /// Não há estoque suficiente para atender o item.
    #[error("Estoque insuficiente para o produto {codigo}. Disponível: {disponivel}, Solicitado: {solicitado}")]
    EstoqueInsuficiente {
        codigo: String,
        disponivel: i32,
        solicitado: i32,
    },

    /// A espera por uma conexão ou pelo bloqueio de uma linha excedeu o limite.
    #[error("Tempo esgotado ao aguardar acesso ao estoque.")]
    TempoEsgotado,

    /// Falha de leitura ou escrita no armazenamento.
    #[error("Falha de armazenamento: {0}")]
    Armazenamento(String),
}

impl From<sqlx::Error> for VendaErro {
    fn from(erro: sqlx::Error) -> Self {
        match &erro {
            sqlx::Error::PoolTimedOut => VendaErro::TempoEsgotado,
            // 55P03 (lock_not_available): o lock_timeout da transação expirou
            sqlx::Error::Database(db) if db.code().as_deref() == Some("55P03") => {
                VendaErro::TempoEsgotado
            }
            _ => VendaErro::Armazenamento(erro.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::VendaErro;

    #[test]
    fn mensagens_de_erro() {
        assert_eq!(
            VendaErro::ProdutoNaoEncontrado("ABC-1".to_string()).to_string(),
            "Produto com código ABC-1 não encontrado para venda."
        );
        assert_eq!(
            VendaErro::EstoqueInsuficiente {
                codigo: "ABC-1".to_string(),
                disponivel: 2,
                solicitado: 5,
            }
            .to_string(),
            "Estoque insuficiente para o produto ABC-1. Disponível: 2, Solicitado: 5"
        );
        assert_eq!(
            VendaErro::TempoEsgotado.to_string(),
            "Tempo esgotado ao aguardar acesso ao estoque."
        );
    }
}
