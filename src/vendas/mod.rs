// src/vendas/mod.rs

// Declara o submódulo que contém as definições das structs de vendas
pub mod vendas_structs;
// Declara o submódulo com os erros do processamento de vendas
pub mod vendas_erro;
// Declara o submódulo com o armazém de vendas (Postgres e memória)
pub mod vendas_armazem;
// Declara o submódulo com o motor de processamento de vendas
pub mod vendas_motor;
// Declara o submódulo que contém as funções de rota relacionadas a vendas
pub mod vendas_router;
