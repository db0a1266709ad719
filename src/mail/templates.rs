fn escape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

fn layout(title: &str, content: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head><meta charset="UTF-8"><title>{title}</title></head>
<body style="font-family: Arial, sans-serif; line-height: 1.6; color: #333; max-width: 600px; margin: 0 auto; padding: 20px;">
  <div style="background: linear-gradient(to right, #4CAF50, #45a049); padding: 20px; text-align: center;">
    <h1 style="color: white; margin: 0;">{title}</h1>
  </div>
  <div style="background-color: #f9f9f9; padding: 20px; border-radius: 0 0 5px 5px;">
{content}
    <p>Best regards,<br>The Authflow team</p>
  </div>
  <p style="text-align: center; color: #888; font-size: 0.8em;">This is an automated message, please do not reply to this email.</p>
</body>
</html>
"#
    )
}

pub fn verification(code: &str) -> String {
    let code = escape(code);
    layout(
        "Verify Your Email",
        &format!(
            r#"    <p>Thank you for signing up! Your verification code is:</p>
    <p style="text-align: center; font-size: 32px; font-weight: bold; letter-spacing: 5px; color: #4CAF50;">{code}</p>
    <p>Enter this code on the verification page to complete your registration.</p>
    <p>This code will expire in 24 hours for security reasons.</p>
    <p>If you didn't create an account with us, please ignore this email.</p>"#
        ),
    )
}

pub fn welcome(name: &str) -> String {
    let name = escape(name);
    layout(
        "Welcome",
        &format!(
            r#"    <p>Hello {name},</p>
    <p>Your email address has been verified and your account is ready to use.</p>"#
        ),
    )
}

pub fn password_reset(url: &str) -> String {
    let url = escape(url);
    layout(
        "Password Reset",
        &format!(
            r#"    <p>We received a request to reset your password. If you didn't make this request, please ignore this email.</p>
    <p>To reset your password, click the button below:</p>
    <p style="text-align: center; margin: 30px 0;"><a href="{url}" style="background-color: #4CAF50; color: white; padding: 12px 20px; text-decoration: none; border-radius: 5px; font-weight: bold;">Reset Password</a></p>
    <p>This link will expire in 1 hour for security reasons.</p>"#
        ),
    )
}

pub fn reset_success() -> String {
    layout(
        "Password Reset Successful",
        r#"    <p>Your password has been successfully reset.</p>
    <p>If you did not initiate this password reset, please contact our support team immediately.</p>"#,
    )
}
