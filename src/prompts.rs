//! Fixed prompt templates for the three Gemini operations. Each template is
//! a versioned contract with the model: a pure function from typed input to
//! the exact instruction string, with named interpolation points and nothing
//! assembled dynamically. Keep wording changes deliberate.

use crate::models::ProductData;

/// Product-page extraction prompt. The call using it must have Google
/// Search enabled or step 1 cannot be followed.
pub fn analysis_prompt(url: &str) -> String {
    format!(
        "Analyze the provided product URL and/or image to extract comprehensive product details for a marketing campaign.\n\
        \n\
        Product URL: {url}\n\
        \n\
        Task:\n\
        1. Use Google Search to find the *exact* product page. Prioritize the URL provided if it exists.\n\
        2. Extract the Product Title exactly as it appears.\n\
        3. Extract a detailed Description.\n\
        4. Extract 5-7 Key Features.\n\
        5. **CRITICAL**: Find the current selling Price.\n\
           - Look for the main price on the product page, in the page's own currency.\n\
           - If multiple prices exist (sale vs regular), return the current sale price.\n\
           - Format as \"Currency Symbol + Amount\" (e.g., R450.00).\n\
        6. Analyze the Brand Voice from the copy (e.g., \"Playful\", \"Professional\", \"Sassy\").\n\
        \n\
        Return a valid JSON object with the following keys:\n\
        - title: string\n\
        - description: string\n\
        - keyFeatures: string[]\n\
        - price: string\n\
        - brandVoice: string\n\
        \n\
        Return ONLY the JSON object. Do not use Markdown formatting or code blocks."
    )
}

/// Strategist prompt for the persona batch. Demands exactly 4 personas
/// bound to the four fixed role archetypes; the structural contract is
/// enforced separately via the response schema.
pub fn persona_prompt(data: &ProductData) -> String {
    let features = data.key_features.join(", ");
    let url = data.url.as_deref().unwrap_or("N/A");
    format!(
        "ACT AS: A world-class Meta Ads Media Buyer & Creative Strategist (Top 1% expertise).\n\
        CONTEXT: You are creating high-performance ad assets for a beauty e-commerce brand.\n\
        \n\
        PRODUCT ANALYSIS:\n\
        Title: {title}\n\
        Description: {description}\n\
        Key Features: {features}\n\
        Price: {price}\n\
        Brand Voice: {brand_voice} (Ensure this voice permeates the copy)\n\
        URL: {url}\n\
        \n\
        TASK:\n\
        Generate 4 distinct, high-converting marketing personas tailored EXACTLY to these categories:\n\
        1. Self-Employed Nail Technician (Freelancer) - Focus: Speed, ROI, Client Retention.\n\
        2. Nail Technician working in a salon (Employee) - Focus: Ease of use, Consistency, Keeping the boss happy.\n\
        3. Salon Owner (Business Minded) - Focus: Profit Margins, Speed of Service, Professional Image.\n\
        4. DIY Nail Enthusiast (Home User) - Focus: Saving money, \"Me time\", Professional results at home.\n\
        \n\
        REQUIREMENTS FOR EACH PERSONA:\n\
        \n\
        1. **Persona Deep Dive**:\n\
           - ID: Unique identifier (e.g., TECH-FREE, TECH-SALON, OWNER, DIY).\n\
           - Emotional Trigger: The deep psychological 'why' (e.g., \"Fear of lifting causing client complaints\", \"Pride in creating art\").\n\
           - Pain Points: Specific, visceral frustrations.\n\
        \n\
        2. **Meta Ad Copy (Primary Text) - The \"Winner\" Variant**:\n\
           - IGNORE generic marketing fluff. Write like a human. Use the vernacular of the specific persona.\n\
           - **CRITICAL STRUCTURE**:\n\
             [HOOK: 1-2 short, punchy sentences. Stop the scroll. Address the pain or desire immediately.]\n\
             \n\
             [BODY: 2-3 short paragraphs using \" \n \" line breaks. Agitate the problem, present the product as the specific solution. Focus on benefits (Speed, Durability, Profit, Ease). Use emojis tastefully if brand voice permits.]\n\
             \n\
             [CTA: Clear, imperative command.]\n\
        \n\
        3. **Headline**:\n\
           - High-CTR, under 40 characters.\n\
           - Examples: \"Stop Wasting Gel\", \"No More Chipping\", \"Client Fave 💅\".\n\
        \n\
        4. **Creative Strategy (Visuals)**:\n\
           - Move beyond generic product shots. We need \"Performance Creative\" ideas.\n\
           - Suggest: UGC-style angles, Split-screens (Old Way vs New Way), Macro texture shots, or \"ASMR\" style application.\n\
           - **prompt_for_imagen**: A highly detailed, art-directed prompt for high-quality generation. Include lighting (e.g., \"Soft ring light\", \"Harsh flash\"), texture (e.g., \"Viscous, glossy gel drip\"), and context.\n\
           - **video_script_draft**: A fast-paced, TikTok/Reels style script.\n\
        \n\
        5. **Targeting**:\n\
           - Precise interest targeting (Brands like OPI/Young Nails, Behaviors, or broad interests for DIY).\n\
        \n\
        OUTPUT:\n\
        Return a SINGLE JSON object containing 'generated_personas' array matching the schema.",
        title = data.title,
        description = data.description,
        price = data.price,
        brand_voice = data.brand_voice,
    )
}

/// The creative direction produced for a persona is already a finished
/// generation prompt; it passes through verbatim.
pub fn visual_prompt(creative_prompt: &str) -> String {
    creative_prompt.to_string()
}
