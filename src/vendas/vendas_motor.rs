// src/vendas/vendas_motor.rs

use bigdecimal::BigDecimal;
use chrono::Utc;
use tracing::error;

use super::vendas_armazem::{ArmazemVendas, UnidadeVenda};
use super::vendas_erro::VendaErro;
use super::vendas_structs::{ItemVenda, RegistroVenda, VendaConcluida};

/// Processa uma venda de produtos como uma única unidade atômica.
///
/// Passos:
/// 1. Valida a requisição localmente: a venda não pode ser vazia e toda
///    quantidade deve ser positiva. Nada de armazenamento é tocado antes disso.
/// 2. Abre uma unidade de trabalho no armazém injetado.
/// 3. Para cada item, na ordem recebida:
///    a. Busca o produto e o bloqueia para atualização.
///    b. Verifica a disponibilidade de estoque.
///    c. Decrementa o estoque e prepara o registro da venda, somando o
///       subtotal ao total da compra.
/// 4. Se todos os itens passarem, confirma a unidade; caso contrário desfaz
///    tudo e retorna o erro do primeiro item que falhou.
///
/// # Invariantes
///
/// - A quantidade em estoque nunca fica negativa.
/// - Ou todos os itens são aplicados, ou nenhum: estoque e registros de venda
///   ficam exatamente como antes da chamada em caso de erro.
/// - Reenviar a mesma venda decrementa o estoque de novo; quem precisa de
///   idempotência deve deduplicar por um identificador próprio.
pub async fn processar_venda(
    armazem: &dyn ArmazemVendas,
    itens: &[ItemVenda],
) -> Result<VendaConcluida, VendaErro> {
    // Validação local, antes de qualquer acesso ao armazenamento
    if itens.is_empty() {
        return Err(VendaErro::RequisicaoInvalida(
            "é esperado um array de produtos a vender".to_string(),
        ));
    }
    for item in itens {
        if item.quantidade <= 0 {
            return Err(VendaErro::RequisicaoInvalida(format!(
                "quantidade inválida para o produto com código {}",
                item.codigo
            )));
        }
    }

    let mut unidade = armazem.iniciar_unidade().await?;

    match estagiar_itens(unidade.as_mut(), itens).await {
        Ok(venda) => {
            unidade.confirmar().await?;
            Ok(venda)
        }
        Err(erro) => {
            // A falha do desfazer não substitui o erro que abortou a venda
            if let Err(erro_desfazer) = unidade.desfazer().await {
                error!("Erro ao desfazer a venda: {}", erro_desfazer);
            }
            Err(erro)
        }
    }
}

/// Prepara os itens na unidade, na ordem recebida.
/// O primeiro item que falhar interrompe o processamento e determina o erro
/// reportado ao chamador.
async fn estagiar_itens(
    unidade: &mut dyn UnidadeVenda,
    itens: &[ItemVenda],
) -> Result<VendaConcluida, VendaErro> {
    let mut total_compra = BigDecimal::from(0);

    for item in itens {
        // 1. Busca o produto e o bloqueia para atualização.
        // Com o mesmo código repetido na venda, esta leitura enxerga o
        // decremento já preparado pelo item anterior.
        let produto = unidade
            .produto_para_atualizar(&item.codigo)
            .await?
            .ok_or_else(|| VendaErro::ProdutoNaoEncontrado(item.codigo.clone()))?;

        // 2. Verifica se há estoque suficiente
        let restante = produto.quantidade - item.quantidade;
        if restante < 0 {
            return Err(VendaErro::EstoqueInsuficiente {
                codigo: item.codigo.clone(),
                disponivel: produto.quantidade,
                solicitado: item.quantidade,
            });
        }

        // 3. Decrementa o estoque do produto
        unidade.atualizar_quantidade(&item.codigo, restante).await?;

        // Calcula o subtotal para o item e adiciona ao total da compra
        let quantidade_bigdecimal = BigDecimal::from(item.quantidade);
        total_compra += &produto.preco * &quantidade_bigdecimal;

        // 4. Prepara o registro da venda com nome e preço do momento
        unidade
            .registrar_venda(&RegistroVenda {
                codigo: produto.codigo,
                nome: produto.nome,
                preco: produto.preco,
                quantidade: item.quantidade,
                data_venda: Utc::now(),
            })
            .await?;
    }

    Ok(VendaConcluida {
        total_compra,
        itens_registrados: itens.len(),
    })
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;
    use std::time::Duration;

    use bigdecimal::BigDecimal;
    use chrono::Utc;
    use futures::future::join_all;

    use super::processar_venda;
    use crate::vendas::vendas_armazem::{ArmazemMemoria, ArmazemVendas};
    use crate::vendas::vendas_erro::VendaErro;
    use crate::vendas::vendas_structs::{ItemVenda, ProdutoEstoque};

    fn item(codigo: &str, quantidade: i32) -> ItemVenda {
        ItemVenda {
            codigo: codigo.to_string(),
            quantidade,
        }
    }

    async fn armazem_com(produtos: &[(&str, i32)]) -> ArmazemMemoria {
        let armazem = ArmazemMemoria::new();
        for (codigo, quantidade) in produtos {
            armazem
                .cadastrar_produto(ProdutoEstoque {
                    codigo: codigo.to_string(),
                    nome: format!("Produto {}", codigo),
                    preco: BigDecimal::from_str("10.50").unwrap(),
                    quantidade: *quantidade,
                })
                .await;
        }
        armazem
    }

    #[actix_web::test]
    async fn venda_simples_decrementa_estoque_e_registra() {
        let armazem = armazem_com(&[("A", 10)]).await;
        let inicio = Utc::now();

        let venda = processar_venda(&armazem, &[item("A", 3)]).await.unwrap();

        assert_eq!(venda.itens_registrados, 1);
        assert_eq!(venda.total_compra, BigDecimal::from_str("31.50").unwrap());
        assert_eq!(armazem.quantidade_de("A").await, Some(7));

        let registros = armazem.registros().await;
        assert_eq!(registros.len(), 1);
        assert_eq!(registros[0].codigo, "A");
        assert_eq!(registros[0].quantidade, 3);
        assert!(registros[0].data_venda >= inicio);
    }

    #[actix_web::test]
    async fn estoque_insuficiente_aborta_sem_alterar_nada() {
        let armazem = armazem_com(&[("A", 2)]).await;

        let erro = processar_venda(&armazem, &[item("A", 5)]).await.unwrap_err();

        assert_eq!(
            erro,
            VendaErro::EstoqueInsuficiente {
                codigo: "A".to_string(),
                disponivel: 2,
                solicitado: 5,
            }
        );
        assert_eq!(armazem.quantidade_de("A").await, Some(2));
        assert_eq!(armazem.total_de_registros().await, 0);
    }

    #[actix_web::test]
    async fn falha_no_segundo_item_desfaz_o_primeiro() {
        let armazem = armazem_com(&[("A", 10), ("B", 1)]).await;

        let erro = processar_venda(&armazem, &[item("A", 3), item("B", 5)])
            .await
            .unwrap_err();

        assert_eq!(
            erro,
            VendaErro::EstoqueInsuficiente {
                codigo: "B".to_string(),
                disponivel: 1,
                solicitado: 5,
            }
        );
        // O decremento de A já estava preparado e foi desfeito junto
        assert_eq!(armazem.quantidade_de("A").await, Some(10));
        assert_eq!(armazem.quantidade_de("B").await, Some(1));
        assert_eq!(armazem.total_de_registros().await, 0);
    }

    #[actix_web::test]
    async fn venda_vazia_e_rejeitada_antes_de_tocar_o_armazem() {
        // O armazém fica ocupado por outra unidade: se o motor tentasse
        // abrir uma unidade, o resultado seria TempoEsgotado
        let armazem = ArmazemMemoria::com_tempo_limite(Duration::from_millis(50));
        let _ocupante = armazem.iniciar_unidade().await.unwrap();

        let erro = processar_venda(&armazem, &[]).await.unwrap_err();

        assert!(matches!(erro, VendaErro::RequisicaoInvalida(_)));
    }

    #[actix_web::test]
    async fn quantidade_nao_positiva_e_rejeitada_antes_de_tocar_o_armazem() {
        let armazem = ArmazemMemoria::com_tempo_limite(Duration::from_millis(50));
        let _ocupante = armazem.iniciar_unidade().await.unwrap();

        let erro = processar_venda(&armazem, &[item("A", 0)]).await.unwrap_err();
        assert!(matches!(erro, VendaErro::RequisicaoInvalida(_)));

        let erro = processar_venda(&armazem, &[item("A", -3)]).await.unwrap_err();
        assert!(matches!(erro, VendaErro::RequisicaoInvalida(_)));
    }

    #[actix_web::test]
    async fn produto_desconhecido_aborta_sem_efeitos() {
        let armazem = armazem_com(&[("A", 10)]).await;

        let erro = processar_venda(&armazem, &[item("X", 1)]).await.unwrap_err();

        assert_eq!(erro, VendaErro::ProdutoNaoEncontrado("X".to_string()));
        assert_eq!(armazem.quantidade_de("A").await, Some(10));
        assert_eq!(armazem.total_de_registros().await, 0);
    }

    #[actix_web::test]
    async fn o_primeiro_item_que_falha_determina_o_erro() {
        let armazem = armazem_com(&[("A", 10), ("B", 1)]).await;

        // O item 2 (produto inexistente) falha antes do item 4 (estoque curto)
        let itens = [item("A", 1), item("X", 1), item("A", 1), item("B", 99)];
        let erro = processar_venda(&armazem, &itens).await.unwrap_err();

        assert_eq!(erro, VendaErro::ProdutoNaoEncontrado("X".to_string()));
        assert_eq!(armazem.quantidade_de("A").await, Some(10));
        assert_eq!(armazem.quantidade_de("B").await, Some(1));
        assert_eq!(armazem.total_de_registros().await, 0);
    }

    #[actix_web::test]
    async fn codigo_repetido_decrementa_em_sequencia() {
        let armazem = armazem_com(&[("A", 10)]).await;

        // A segunda ocorrência enxerga o decremento da primeira: sobram 4
        let erro = processar_venda(&armazem, &[item("A", 6), item("A", 6)])
            .await
            .unwrap_err();

        assert_eq!(
            erro,
            VendaErro::EstoqueInsuficiente {
                codigo: "A".to_string(),
                disponivel: 4,
                solicitado: 6,
            }
        );
        assert_eq!(armazem.quantidade_de("A").await, Some(10));

        // Quando as duas ocorrências cabem no estoque, a venda esvazia o produto
        let venda = processar_venda(&armazem, &[item("A", 6), item("A", 4)])
            .await
            .unwrap();
        assert_eq!(venda.itens_registrados, 2);
        assert_eq!(armazem.quantidade_de("A").await, Some(0));
        assert_eq!(armazem.total_de_registros().await, 2);
    }

    #[actix_web::test]
    async fn vendas_sucessivas_conservam_o_estoque() {
        let armazem = armazem_com(&[("A", 10), ("B", 8)]).await;

        processar_venda(&armazem, &[item("A", 2), item("B", 3)])
            .await
            .unwrap();
        processar_venda(&armazem, &[item("A", 1)]).await.unwrap();
        processar_venda(&armazem, &[item("B", 5)]).await.unwrap();

        assert_eq!(armazem.quantidade_de("A").await, Some(7));
        assert_eq!(armazem.quantidade_de("B").await, Some(0));
        assert_eq!(armazem.total_de_registros().await, 4);

        // Com o estoque zerado, nenhuma venda leva a quantidade abaixo de zero
        let erro = processar_venda(&armazem, &[item("B", 1)]).await.unwrap_err();
        assert_eq!(
            erro,
            VendaErro::EstoqueInsuficiente {
                codigo: "B".to_string(),
                disponivel: 0,
                solicitado: 1,
            }
        );
        assert_eq!(armazem.quantidade_de("B").await, Some(0));
    }

    #[actix_web::test]
    async fn registros_correspondem_aos_itens_da_venda() {
        let armazem = armazem_com(&[("A", 10), ("B", 8)]).await;
        let inicio = Utc::now();

        let itens = [item("A", 2), item("B", 3), item("A", 1)];
        processar_venda(&armazem, &itens).await.unwrap();

        let registros = armazem.registros().await;
        assert_eq!(registros.len(), itens.len());
        for (registro, item) in registros.iter().zip(itens.iter()) {
            assert_eq!(registro.codigo, item.codigo);
            assert_eq!(registro.quantidade, item.quantidade);
            assert_eq!(registro.nome, format!("Produto {}", item.codigo));
            assert!(registro.data_venda >= inicio);
        }
    }

    #[actix_web::test]
    async fn vendas_concorrentes_nao_vendem_alem_do_estoque() {
        let armazem = armazem_com(&[("A", 10)]).await;

        // 12 vendas de 1 unidade disputando 10 em estoque
        let resultados = join_all((0..12).map(|_| async {
            let lote = [item("A", 1)];
            processar_venda(&armazem, &lote).await
        }))
        .await;

        let confirmadas = resultados.iter().filter(|r| r.is_ok()).count();
        let recusadas = resultados
            .iter()
            .filter(|r| matches!(r, Err(VendaErro::EstoqueInsuficiente { .. })))
            .count();

        assert_eq!(confirmadas, 10);
        assert_eq!(recusadas, 2);
        assert_eq!(armazem.quantidade_de("A").await, Some(0));
        assert_eq!(armazem.total_de_registros().await, 10);
    }

    #[actix_web::test]
    async fn espera_pelo_estoque_respeita_o_tempo_limite() {
        let armazem = ArmazemMemoria::com_tempo_limite(Duration::from_millis(50));
        armazem
            .cadastrar_produto(ProdutoEstoque {
                codigo: "A".to_string(),
                nome: "Produto A".to_string(),
                preco: BigDecimal::from(10),
                quantidade: 1,
            })
            .await;

        let ocupante = armazem.iniciar_unidade().await.unwrap();

        let lote = [item("A", 1)];
        let erro = processar_venda(&armazem, &lote).await.unwrap_err();
        assert_eq!(erro, VendaErro::TempoEsgotado);

        drop(ocupante);
        assert_eq!(armazem.quantidade_de("A").await, Some(1));
        assert_eq!(armazem.total_de_registros().await, 0);
    }
}
