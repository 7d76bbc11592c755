//! 端点暴露的变量表。
//!
//! 每个仿真端点持有一张变量表，键为输出点位名。写入先按名字匹配，
//! 没有命中再按地址扫描；地址命中多个变量时取名字字典序最小的
//! 那个，保证结果可复现。

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;

use domain::now_epoch_ms;

/// 建表时的变量声明。
#[derive(Debug, Clone)]
pub struct VariableSpec {
    pub name: String,
    pub address: String,
}

/// 变量的当前状态。
#[derive(Debug, Clone)]
pub struct VariableState {
    pub name: String,
    pub address: String,
    pub value: f64,
    pub updated_at_ms: i64,
}

/// 线程安全的变量表。克隆共享同一份底层数据。
#[derive(Debug, Clone)]
pub struct VariableTable {
    vars: Arc<RwLock<HashMap<String, VariableState>>>,
}

impl VariableTable {
    /// 按声明建表，所有变量初值 0。
    pub fn new(specs: Vec<VariableSpec>) -> Self {
        let now = now_epoch_ms();
        let vars = specs
            .into_iter()
            .map(|spec| {
                (
                    spec.name.clone(),
                    VariableState {
                        name: spec.name,
                        address: spec.address,
                        value: 0.0,
                        updated_at_ms: now,
                    },
                )
            })
            .collect();
        Self {
            vars: Arc::new(RwLock::new(vars)),
        }
    }

    /// 覆写一个变量的值，先按名字匹配，再按地址回退。
    /// 返回是否命中；没命中不做任何事。
    pub async fn write(&self, name_or_address: &str, value: f64) -> bool {
        let mut vars = self.vars.write().await;
        if let Some(var) = vars.get_mut(name_or_address) {
            var.value = value;
            var.updated_at_ms = now_epoch_ms();
            return true;
        }
        let fallback = vars
            .iter()
            .filter(|(_, var)| var.address == name_or_address)
            .map(|(key, _)| key.clone())
            .min();
        match fallback {
            Some(key) => {
                if let Some(var) = vars.get_mut(&key) {
                    var.value = value;
                    var.updated_at_ms = now_epoch_ms();
                }
                true
            }
            None => false,
        }
    }

    /// 按名字读一个变量。
    pub async fn read(&self, name: &str) -> Option<VariableState> {
        self.vars.read().await.get(name).cloned()
    }

    /// 全量快照，按名字排序。
    pub async fn snapshot(&self) -> Vec<VariableState> {
        let vars = self.vars.read().await;
        let mut items: Vec<VariableState> = vars.values().cloned().collect();
        items.sort_by(|a, b| a.name.cmp(&b.name));
        items
    }

    pub async fn len(&self) -> usize {
        self.vars.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.vars.read().await.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> VariableTable {
        VariableTable::new(vec![
            VariableSpec {
                name: "Gateway_Temperature".to_string(),
                address: "ns=1;s=Temperature".to_string(),
            },
            VariableSpec {
                name: "Gateway_Pressure".to_string(),
                address: "ns=1;s=Pressure".to_string(),
            },
        ])
    }

    #[tokio::test]
    async fn variables_start_at_zero() {
        let table = table();
        assert_eq!(table.len().await, 2);
        let var = table.read("Gateway_Temperature").await.expect("variable");
        assert_eq!(var.value, 0.0);
    }

    #[tokio::test]
    async fn write_matches_name_first() {
        let table = table();
        assert!(table.write("Gateway_Pressure", 6.89).await);
        let var = table.read("Gateway_Pressure").await.expect("variable");
        assert_eq!(var.value, 6.89);
    }

    #[tokio::test]
    async fn write_falls_back_to_address() {
        let table = table();
        assert!(table.write("ns=1;s=Temperature", 25.5).await);
        let var = table.read("Gateway_Temperature").await.expect("variable");
        assert_eq!(var.value, 25.5);
    }

    #[tokio::test]
    async fn unmatched_write_is_rejected() {
        let table = table();
        assert!(!table.write("ns=9;s=Nope", 1.0).await);
        let snapshot = table.snapshot().await;
        assert!(snapshot.iter().all(|var| var.value == 0.0));
    }

    #[tokio::test]
    async fn ambiguous_address_takes_smallest_name() {
        let table = VariableTable::new(vec![
            VariableSpec {
                name: "B_Var".to_string(),
                address: "40001".to_string(),
            },
            VariableSpec {
                name: "A_Var".to_string(),
                address: "40001".to_string(),
            },
        ]);
        assert!(table.write("40001", 7.0).await);
        assert_eq!(table.read("A_Var").await.expect("variable").value, 7.0);
        assert_eq!(table.read("B_Var").await.expect("variable").value, 0.0);
    }
}
