use crate::models::{AttendancePrediction, AttendanceTrend, RiskLevel};

/// Classify one student's chronological trend series into a risk tier. The
/// window sizes and thresholds are fixed contract values; callers depend on
/// identical input always producing identical output.
pub fn predict_risk(student_id: &str, trend: &[AttendanceTrend]) -> AttendancePrediction {
    if trend.len() < 5 {
        return insufficient_data(student_id);
    }

    let percentages: Vec<f64> = trend.iter().map(|point| point.percentage as f64).collect();

    let recent = &percentages[percentages.len().saturating_sub(7)..];
    // A distinct comparison window needs a full 7 points before the recent
    // ones; otherwise the trend change degenerates to zero.
    let previous = if percentages.len() >= 14 {
        &percentages[percentages.len() - 14..percentages.len() - 7]
    } else {
        recent
    };

    let recent_avg = mean(recent);
    let trend_change = recent_avg - mean(previous);
    let consistency = 100.0 - variance(&percentages).sqrt();

    let (risk_level, explanation) = if recent_avg < 70.0 {
        (RiskLevel::High, "Attendance below 70%")
    } else if recent_avg < 80.0 {
        (RiskLevel::Medium, "Attendance between 70-80%")
    } else if trend_change < -5.0 {
        (RiskLevel::Medium, "Declining attendance trend")
    } else if consistency < 60.0 {
        (RiskLevel::Medium, "Inconsistent attendance pattern")
    } else {
        (RiskLevel::Low, "Good attendance record")
    };

    AttendancePrediction {
        student_id: student_id.to_string(),
        risk_level,
        predicted_attendance: (recent_avg + trend_change).round().clamp(0.0, 100.0) as u8,
        explanation: explanation.to_string(),
    }
}

pub fn insufficient_data(student_id: &str) -> AttendancePrediction {
    AttendancePrediction {
        student_id: student_id.to_string(),
        risk_level: RiskLevel::Low,
        predicted_attendance: 90,
        explanation: "Insufficient data for accurate prediction".to_string(),
    }
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

fn variance(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let center = mean(values);
    values
        .iter()
        .map(|value| (value - center).powi(2))
        .sum::<f64>()
        / values.len() as f64
}
