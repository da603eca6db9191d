use serde::Serialize;

/// 皮肤状况预测结果
#[derive(Debug, Clone, Serialize)]
pub struct SkinPrediction {
    /// 最近簇id
    pub cluster_id: i64,
    /// 映射得到的状况名称，未映射时为"unknown"
    pub condition: String,
}

/// 表情识别预测结果
#[derive(Debug, Clone, Serialize)]
pub struct ExpressionPrediction {
    /// 概率最大的表情名称
    pub expression: String,
    /// 对应的概率
    pub probability: f32,
    /// 类别名序列（与probabilities按位对应）
    pub class_names: Vec<String>,
    /// 各类别概率分布
    pub probabilities: Vec<f32>,
}

impl ExpressionPrediction {
    /// 渲染各类别概率的控制台柱状图
    pub fn render_chart(&self) -> String {
        const BAR_WIDTH: usize = 32;

        let name_width = self
            .class_names
            .iter()
            .map(|name| name.len())
            .max()
            .unwrap_or(0);

        let mut chart = String::new();
        for (name, prob) in self.class_names.iter().zip(self.probabilities.iter()) {
            let filled = ((prob * BAR_WIDTH as f32).round() as usize).min(BAR_WIDTH);
            chart.push_str(&format!(
                "{:<width$}  {:<bar$}  {:.4}\n",
                name,
                "█".repeat(filled),
                prob,
                width = name_width,
                bar = BAR_WIDTH,
            ));
        }

        chart
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_chart_one_row_per_class() {
        let prediction = ExpressionPrediction {
            expression: "happiness".to_string(),
            probability: 0.75,
            class_names: vec![
                "anger".to_string(),
                "happiness".to_string(),
                "neutral".to_string(),
            ],
            probabilities: vec![0.05, 0.75, 0.2],
        };

        let chart = prediction.render_chart();
        let lines: Vec<&str> = chart.lines().collect();

        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("anger"));
        assert!(lines[1].contains("0.7500"));
    }

    #[test]
    fn test_render_chart_caps_bar_width() {
        let prediction = ExpressionPrediction {
            expression: "anger".to_string(),
            probability: 1.0,
            class_names: vec!["anger".to_string()],
            probabilities: vec![1.0],
        };

        let chart = prediction.render_chart();

        assert_eq!(chart.matches('█').count(), 32);
    }
}
