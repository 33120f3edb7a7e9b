// src/vendas/vendas_armazem.rs

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::{Pool, Postgres, Transaction};
use tokio::sync::{Mutex, OwnedMutexGuard};

use super::vendas_erro::VendaErro;
use super::vendas_structs::{LinhaRelatorio, ProdutoEstoque, RegistroVenda};

/// Backend de armazenamento das vendas.
///
/// O motor de vendas recebe esse backend injetado e abre uma unidade de
/// trabalho por venda. A implementação Postgres usa uma transação por
/// unidade; a implementação em memória serve de substituto nos testes.
#[async_trait]
pub trait ArmazemVendas: Send + Sync {
    /// Abre uma unidade de trabalho transacional para uma venda.
    async fn iniciar_unidade(&self) -> Result<Box<dyn UnidadeVenda>, VendaErro>;

    /// Consulta os registros de venda confirmados, unidos ao nome atual do
    /// produto, do mais antigo para o mais recente. O filtro de datas só é
    /// aplicado quando as duas datas são informadas.
    async fn consultar_vendas(
        &self,
        data_inicio: Option<NaiveDate>,
        data_fim: Option<NaiveDate>,
    ) -> Result<Vec<LinhaRelatorio>, VendaErro>;
}

/// Unidade de trabalho de uma única venda.
///
/// Tudo que for preparado aqui só fica visível para outras chamadas após
/// `confirmar`. `desfazer` descarta tudo. Uma unidade abandonada (caller
/// desistiu da requisição) é descartada no drop, com a mesma garantia do
/// `desfazer`.
#[async_trait]
pub trait UnidadeVenda: Send {
    /// Lê o produto pelo código e bloqueia a linha até o fim da unidade.
    /// Retorna None se o código não existe.
    async fn produto_para_atualizar(
        &mut self,
        codigo: &str,
    ) -> Result<Option<ProdutoEstoque>, VendaErro>;

    /// Prepara a nova quantidade em estoque do produto.
    async fn atualizar_quantidade(
        &mut self,
        codigo: &str,
        nova_quantidade: i32,
    ) -> Result<(), VendaErro>;

    /// Prepara a gravação de um registro de venda.
    async fn registrar_venda(&mut self, registro: &RegistroVenda) -> Result<(), VendaErro>;

    /// Aplica todas as alterações preparadas como uma única unidade atômica.
    async fn confirmar(self: Box<Self>) -> Result<(), VendaErro>;

    /// Descarta todas as alterações preparadas.
    async fn desfazer(self: Box<Self>) -> Result<(), VendaErro>;
}

// --- Implementação Postgres ---

/// Armazém de vendas sobre o pool de conexões Postgres.
pub struct ArmazemPostgres {
    pool: Pool<Postgres>,
}

impl ArmazemPostgres {
    pub fn new(pool: Pool<Postgres>) -> Self {
        ArmazemPostgres { pool }
    }
}

#[async_trait]
impl ArmazemVendas for ArmazemPostgres {
    async fn iniciar_unidade(&self) -> Result<Box<dyn UnidadeVenda>, VendaErro> {
        // Uma conexão emprestada do pool e uma transação por venda
        let mut tx = self.pool.begin().await?;

        // Limita a espera pelo bloqueio de linha; a expiração chega como
        // erro 55P03 e vira VendaErro::TempoEsgotado
        sqlx::query("SET LOCAL lock_timeout = '5s'")
            .execute(&mut *tx)
            .await?;

        Ok(Box::new(UnidadePostgres { tx }))
    }

    async fn consultar_vendas(
        &self,
        data_inicio: Option<NaiveDate>,
        data_fim: Option<NaiveDate>,
    ) -> Result<Vec<LinhaRelatorio>, VendaErro> {
        let linhas = match (data_inicio, data_fim) {
            (Some(inicio), Some(fim)) => {
                sqlx::query_as::<_, LinhaRelatorio>(
                    "SELECT v.codigo, p.nome, v.quantidade, v.preco, v.data_venda \
                     FROM vendas v \
                     JOIN produtos p ON v.codigo = p.codigo \
                     WHERE v.data_venda::date BETWEEN $1 AND $2 \
                     ORDER BY v.data_venda",
                )
                .bind(inicio)
                .bind(fim)
                .fetch_all(&self.pool)
                .await?
            }
            _ => {
                sqlx::query_as::<_, LinhaRelatorio>(
                    "SELECT v.codigo, p.nome, v.quantidade, v.preco, v.data_venda \
                     FROM vendas v \
                     JOIN produtos p ON v.codigo = p.codigo \
                     ORDER BY v.data_venda",
                )
                .fetch_all(&self.pool)
                .await?
            }
        };

        Ok(linhas)
    }
}

/// Unidade de trabalho Postgres: uma transação com bloqueio de linha.
/// Se a unidade for abandonada sem confirmar, o drop da transação desfaz tudo.
struct UnidadePostgres {
    tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl UnidadeVenda for UnidadePostgres {
    async fn produto_para_atualizar(
        &mut self,
        codigo: &str,
    ) -> Result<Option<ProdutoEstoque>, VendaErro> {
        // FOR UPDATE bloqueia a linha para evitar race conditions em ambientes multi-usuário
        let produto = sqlx::query_as::<_, ProdutoEstoque>(
            "SELECT codigo, nome, preco, quantidade FROM produtos WHERE codigo = $1 FOR UPDATE",
        )
        .bind(codigo)
        .fetch_optional(&mut *self.tx)
        .await?;

        Ok(produto)
    }

    async fn atualizar_quantidade(
        &mut self,
        codigo: &str,
        nova_quantidade: i32,
    ) -> Result<(), VendaErro> {
        sqlx::query("UPDATE produtos SET quantidade = $1 WHERE codigo = $2")
            .bind(nova_quantidade)
            .bind(codigo)
            .execute(&mut *self.tx)
            .await?;

        Ok(())
    }

    async fn registrar_venda(&mut self, registro: &RegistroVenda) -> Result<(), VendaErro> {
        sqlx::query(
            "INSERT INTO vendas (codigo, nome, preco, quantidade, data_venda) \
             VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(&registro.codigo)
        .bind(&registro.nome)
        .bind(&registro.preco)
        .bind(registro.quantidade)
        .bind(registro.data_venda)
        .execute(&mut *self.tx)
        .await?;

        Ok(())
    }

    async fn confirmar(self: Box<Self>) -> Result<(), VendaErro> {
        self.tx.commit().await?;
        Ok(())
    }

    async fn desfazer(self: Box<Self>) -> Result<(), VendaErro> {
        self.tx.rollback().await?;
        Ok(())
    }
}

// --- Implementação em memória ---

#[derive(Default)]
struct EstadoMemoria {
    produtos: HashMap<String, ProdutoEstoque>,
    vendas: Vec<RegistroVenda>,
}

/// Armazém de vendas em memória.
///
/// Todo o estado fica atrás de um único Mutex; a unidade de trabalho é dona
/// do guard durante a sua vida inteira, então unidades concorrentes são
/// serializadas. A espera pelo Mutex é limitada por `tempo_limite`.
pub struct ArmazemMemoria {
    estado: Arc<Mutex<EstadoMemoria>>,
    tempo_limite: Duration,
}

impl ArmazemMemoria {
    pub fn new() -> Self {
        Self::com_tempo_limite(Duration::from_secs(5))
    }

    pub fn com_tempo_limite(tempo_limite: Duration) -> Self {
        ArmazemMemoria {
            estado: Arc::new(Mutex::new(EstadoMemoria::default())),
            tempo_limite,
        }
    }

    /// Insere ou substitui um produto diretamente, fora de qualquer venda.
    pub async fn cadastrar_produto(&self, produto: ProdutoEstoque) {
        let mut estado = self.estado.lock().await;
        estado.produtos.insert(produto.codigo.clone(), produto);
    }

    /// Quantidade em estoque de um produto, se ele existir.
    pub async fn quantidade_de(&self, codigo: &str) -> Option<i32> {
        let estado = self.estado.lock().await;
        estado.produtos.get(codigo).map(|p| p.quantidade)
    }

    /// Total de registros de venda confirmados.
    pub async fn total_de_registros(&self) -> usize {
        let estado = self.estado.lock().await;
        estado.vendas.len()
    }

    /// Cópia dos registros de venda confirmados, na ordem de gravação.
    pub async fn registros(&self) -> Vec<RegistroVenda> {
        let estado = self.estado.lock().await;
        estado.vendas.clone()
    }
}

impl Default for ArmazemMemoria {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ArmazemVendas for ArmazemMemoria {
    async fn iniciar_unidade(&self) -> Result<Box<dyn UnidadeVenda>, VendaErro> {
        let guarda = tokio::time::timeout(self.tempo_limite, self.estado.clone().lock_owned())
            .await
            .map_err(|_| VendaErro::TempoEsgotado)?;

        Ok(Box::new(UnidadeMemoria {
            guarda,
            quantidades: HashMap::new(),
            registros: Vec::new(),
        }))
    }

    async fn consultar_vendas(
        &self,
        data_inicio: Option<NaiveDate>,
        data_fim: Option<NaiveDate>,
    ) -> Result<Vec<LinhaRelatorio>, VendaErro> {
        let estado = self.estado.lock().await;

        let linhas = estado
            .vendas
            .iter()
            .filter(|registro| match (data_inicio, data_fim) {
                (Some(inicio), Some(fim)) => {
                    let data = registro.data_venda.date_naive();
                    data >= inicio && data <= fim
                }
                _ => true,
            })
            // JOIN com produtos: registros de produtos já removidos ficam de fora
            .filter_map(|registro| {
                estado.produtos.get(&registro.codigo).map(|produto| LinhaRelatorio {
                    codigo: registro.codigo.clone(),
                    nome: produto.nome.clone(),
                    quantidade: registro.quantidade,
                    preco: registro.preco.clone(),
                    data_venda: registro.data_venda,
                })
            })
            .collect();

        Ok(linhas)
    }
}

/// Unidade de trabalho em memória: segura o guard do estado e acumula as
/// alterações localmente até `confirmar`. O drop sem confirmação descarta tudo.
struct UnidadeMemoria {
    guarda: OwnedMutexGuard<EstadoMemoria>,
    quantidades: HashMap<String, i32>,
    registros: Vec<RegistroVenda>,
}

#[async_trait]
impl UnidadeVenda for UnidadeMemoria {
    async fn produto_para_atualizar(
        &mut self,
        codigo: &str,
    ) -> Result<Option<ProdutoEstoque>, VendaErro> {
        // A leitura enxerga as quantidades já preparadas nesta unidade, para
        // que o mesmo código repetido na venda decremente em sequência
        Ok(self.guarda.produtos.get(codigo).map(|produto| {
            let quantidade = self
                .quantidades
                .get(codigo)
                .copied()
                .unwrap_or(produto.quantidade);
            ProdutoEstoque {
                quantidade,
                ..produto.clone()
            }
        }))
    }

    async fn atualizar_quantidade(
        &mut self,
        codigo: &str,
        nova_quantidade: i32,
    ) -> Result<(), VendaErro> {
        self.quantidades.insert(codigo.to_string(), nova_quantidade);
        Ok(())
    }

    async fn registrar_venda(&mut self, registro: &RegistroVenda) -> Result<(), VendaErro> {
        self.registros.push(registro.clone());
        Ok(())
    }

    async fn confirmar(self: Box<Self>) -> Result<(), VendaErro> {
        let UnidadeMemoria {
            mut guarda,
            quantidades,
            registros,
        } = *self;

        for (codigo, quantidade) in quantidades {
            if let Some(produto) = guarda.produtos.get_mut(&codigo) {
                produto.quantidade = quantidade;
            }
        }
        guarda.vendas.extend(registros);

        Ok(())
    }

    async fn desfazer(self: Box<Self>) -> Result<(), VendaErro> {
        // As alterações preparadas morrem com a unidade
        Ok(())
    }
}
