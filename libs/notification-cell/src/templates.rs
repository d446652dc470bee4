//! HTML bodies for the transactional emails. Kept as single-table layouts
//! so they survive the lowest common denominator of mail clients.

fn layout(title: &str, body: &str) -> String {
    format!(
        r#"<html style="width:100%; height:100%;">
<head>
  <meta http-equiv="Content-Type" content="text/html; charset=utf-8" />
  <meta name="viewport" content="width=device-width, initial-scale=1.0"/>
  <title>{title}</title>
</head>
<body style="margin:0; padding:32px; font:normal 14px/21px Arial,sans-serif; color:#333;">
  <table style="width:450px; margin:auto; border-spacing:0; border-collapse:collapse;">
    <tr><td style="text-align:left;">
      <div style="padding:21px 32px; background-color:#f3f3f3; border-bottom:2px solid #e1e1e1; border-radius:3px;">
        <h1 style="font-size:21px; line-height:30px; font-weight:bold;">{title}</h1>
        {body}
      </div>
    </td></tr>
  </table>
</body>
</html>"#
    )
}

fn button(url: &str, label: &str) -> String {
    format!(
        r#"<a href="{url}" style="border-radius:10px; background-color:#00E573; padding:0.75rem 2rem; font-weight:600; color:white;">{label}</a>"#
    )
}

pub fn verification(verify_url: &str) -> String {
    let link = button(verify_url, "Verify email");
    layout(
        "Email verification",
        &format!(r#"<p style="padding:11px 0;">{link}</p>"#),
    )
}

pub fn password_reset(reset_url: &str) -> String {
    let link = button(reset_url, "New password");
    layout(
        "Password reset",
        &format!(
            r#"<p style="padding:11px 0;">You asked to reset your password. Follow the link below to choose a new one:<br><br>{link}</p>"#
        ),
    )
}

pub fn booking_for_practitioner(start: &str, notes: &str) -> String {
    layout(
        "New consultation",
        &format!(
            r#"<p style="padding:11px 0;">A new consultation has been booked:<br>Date: {start}<br>Notes: {notes}</p>"#
        ),
    )
}

pub fn booking_for_patient(start: &str, notes: &str) -> String {
    layout(
        "Consultation confirmed",
        &format!(
            r#"<p style="padding:11px 0;">Your consultation details:<br>Date: {start}<br>Notes: {notes}</p>"#
        ),
    )
}

pub fn cancellation(reason: &str) -> String {
    format!(
        r#"<h3>Consultation cancelled</h3>
<p>Your consultation has been cancelled by the practitioner.</p>
<p>Reason: {reason}</p>"#
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verification_embeds_link() {
        let html = verification("https://clinic.test/verify/tok123");
        assert!(html.contains("https://clinic.test/verify/tok123"));
        assert!(html.contains("Email verification"));
    }

    #[test]
    fn cancellation_carries_reason() {
        let html = cancellation("practitioner unavailable");
        assert!(html.contains("Reason: practitioner unavailable"));
    }

    #[test]
    fn booking_templates_differ_per_recipient() {
        let to_doctor = booking_for_practitioner("2026-09-01 10:00", "n/a");
        let to_patient = booking_for_patient("2026-09-01 10:00", "n/a");
        assert!(to_doctor.contains("New consultation"));
        assert!(to_patient.contains("Consultation confirmed"));
        assert_ne!(to_doctor, to_patient);
    }
}
